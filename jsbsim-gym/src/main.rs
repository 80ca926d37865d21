use anyhow::Result;
use clap::{Parser, Subcommand};
use jsbsim_gym_agent::{
    mlp::{Mlp, Mlp2, MlpConfig},
    opt::OptimizerConfig,
    sac::{ActorConfig, CriticConfig, EntCoefMode, Sac, SacConfig},
    TensorboardRecorder,
};
use jsbsim_gym_core::{
    generic_replay_buffer::{
        ArrayBatch, SimpleReplayBuffer, SimpleReplayBufferConfig, SimpleStepProcessor,
        SimpleStepProcessorConfig,
    },
    record::{BufferedRecorder, NullRecorder, Record},
    util, Agent, DefaultEvaluator, Env as _, ExperienceBufferBase, Policy, ReplayBufferBase,
    StepProcessor, TimeLimit, Trainer, TrainerConfig,
};
use jsbsim_gym_env::{
    registry, ConstantPolicy, FlightAct, FlightEnv, FlightEnvConfig, MockFdm, MockFdmConfig,
    RandomPolicy, ShapedFlightEnv, JSBSIM_V1, OBS_DIM,
};
use log::{info, warn};
use serde::Serialize;
use std::{
    convert::TryFrom,
    fs::{self, File},
    path::{Path, PathBuf},
};

type Config = FlightEnvConfig<MockFdmConfig>;
type Env = TimeLimit<ShapedFlightEnv<MockFdm>>;

type ReplayBuffer = SimpleReplayBuffer<ArrayBatch, ArrayBatch>;
type StepProc = SimpleStepProcessor<Env, ArrayBatch, ArrayBatch>;
type SacAgent = Sac<Env, Mlp, Mlp2, ReplayBuffer>;
type AgentConfig = SacConfig<MlpConfig, MlpConfig>;

/// Action flown by the demo: slight right roll, nose up, half throttle.
const DEMO_ACT: [f64; 4] = [0.05, -0.2, 0.0, 0.5];

const ACT_DIM: usize = FlightAct::LOW.len();
const LR: f64 = 3e-4;
const BATCH_SIZE: usize = 256;
const WARMUP_PERIOD: usize = 100;
const REPLAY_BUFFER_CAPACITY: usize = 1_000_000;
const EVAL_INTERVAL: usize = 10_000;
const SAVE_INTERVAL: usize = 100_000;
const RECORD_INTERVAL: usize = 1_000;
const N_EPISODES_PER_EVAL: usize = 5;

/// Run the JSBSim flight environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Environment configuration in YAML; defaults are used if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fly a constant action and render every step
    Demo {
        /// Number of steps
        #[arg(short, long, default_value_t = 1200)]
        n_steps: usize,
    },

    /// Evaluate a policy on JSBSim-v1
    Eval {
        /// Number of episodes
        #[arg(short, long, default_value_t = 5)]
        n_episodes: usize,

        /// Fly the demo action instead of random actions
        #[arg(long, default_value_t = false)]
        constant: bool,

        /// Seed of the random policy
        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Render every step in the configured mode
        #[arg(short, long, default_value_t = false)]
        render: bool,

        /// Write step records to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Train a SAC agent on JSBSim-v1, then save the model and the replay buffer
    Train {
        /// Number of optimization steps; one is taken per environment step after warmup
        #[arg(long, default_value_t = 3_000_000)]
        max_opts: usize,

        /// Directory of the trained model
        #[arg(long, default_value = "models/jsbsim_sac")]
        model_dir: PathBuf,

        /// File of the replay buffer
        #[arg(long, default_value = "models/jsbsim_sac_buffer.bin")]
        buffer: PathBuf,

        /// Directory of tensorboard logs
        #[arg(long, default_value = "logs")]
        logdir: PathBuf,

        /// SAC configuration in YAML; defaults are used if omitted
        #[arg(long)]
        agent_config: Option<PathBuf>,
    },

    /// Fly one deterministic episode with a trained SAC agent, rendering every step
    Test {
        /// Directory of the trained model
        #[arg(long, default_value = "models/jsbsim_sac")]
        model_dir: PathBuf,

        /// SAC configuration in YAML; must match the one used for training
        #[arg(long)]
        agent_config: Option<PathBuf>,
    },

    /// Write the default configuration
    Config {
        /// Output path
        #[arg(default_value = "jsbsim_gym.yaml")]
        path: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct StepRecord {
    episode: usize,
    step: usize,
    reward: f32,
    shaping_reward: f32,
    altitude_m: f32,
    sim_time: f32,
    obs: Vec<f32>,
}

impl TryFrom<&Record> for StepRecord {
    type Error = anyhow::Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(Self {
            episode: record.get_scalar("episode")? as _,
            step: record.get_scalar("step")? as _,
            reward: record.get_scalar("reward")?,
            shaping_reward: record.get_scalar("shaping_reward")?,
            altitude_m: record.get_scalar("altitude_m")?,
            sim_time: record.get_scalar("sim_time")?,
            obs: record.get_array1("obs")?.to_vec(),
        })
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            info!("Load config from {:?}", path);
            Config::load(path)
        }
        None => Ok(Config::default()),
    }
}

/// Resets, then steps with [`DEMO_ACT`] and renders until `n_steps` or termination.
///
/// Returns the number of steps flown.
fn demo(config: &Config, n_steps: usize) -> Result<usize> {
    let mut env = FlightEnv::<MockFdm>::build(config, 0)?;
    let mode = config.render_mode.to_string();
    let act: FlightAct = DEMO_ACT.into();

    env.reset(None)?;
    let mut count = 0;
    for _ in 0..n_steps {
        let (step, _) = env.step(&act)?;
        env.render(&mode)?;
        count += 1;
        if step.is_done() {
            info!("Terminated after {} steps", count);
            break;
        }
    }
    env.close();

    info!(
        "Flew {} steps, {:.1} s simulated, altitude {:.1} m",
        count,
        env.sim_time(),
        env.state().altitude_m()
    );
    Ok(count)
}

fn write_csv(recorder: &BufferedRecorder, path: &Path) -> Result<()> {
    // Vec<_> field in a struct does not support writing a header in csv crate, so disable it.
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(File::create(path)?);
    for record in recorder.iter() {
        wtr.serialize(StepRecord::try_from(record)?)?;
    }
    wtr.flush()?;
    info!("Wrote {} step records to {:?}", recorder.len(), path);
    Ok(())
}

fn eval<P: Policy<Env>>(
    config: &Config,
    n_episodes: usize,
    policy: &mut P,
    render: bool,
    csv: Option<&Path>,
) -> Result<Vec<f32>> {
    let mut env = registry::<MockFdm>()?.make(JSBSIM_V1, config, 0)?;
    let mode = config.render_mode.to_string();
    let render_mode = if render { Some(mode.as_str()) } else { None };

    let returns = match csv {
        Some(path) => {
            let mut recorder = BufferedRecorder::new();
            let returns =
                util::eval_with_recorder(&mut env, policy, n_episodes, render_mode, &mut recorder)?;
            write_csv(&recorder, path)?;
            returns
        }
        None => {
            let mut recorder = NullRecorder::new();
            util::eval_with_recorder(&mut env, policy, n_episodes, render_mode, &mut recorder)?
        }
    };
    env.close();

    let mean = returns.iter().sum::<f32>() / returns.len().max(1) as f32;
    info!("Mean return over {} episodes: {}", returns.len(), mean);
    Ok(returns)
}

fn load_agent_config(path: Option<&Path>) -> Result<AgentConfig> {
    if let Some(path) = path {
        return AgentConfig::load(path);
    }

    let actor_config = ActorConfig::default()
        .opt_config(OptimizerConfig::Adam { lr: LR })
        .pi_config(MlpConfig::new(OBS_DIM, vec![256, 256], ACT_DIM, false));
    let critic_config = CriticConfig::default()
        .opt_config(OptimizerConfig::Adam { lr: LR })
        .q_config(MlpConfig::new(OBS_DIM + ACT_DIM, vec![256, 256], 1, false));
    Ok(AgentConfig::default()
        .batch_size(BATCH_SIZE)
        .ent_coef_mode(EntCoefMode::Auto(-(ACT_DIM as f64), LR))
        .actor_config(actor_config)
        .critic_config(critic_config))
}

fn trainer_config(max_opts: usize, model_dir: &Path) -> TrainerConfig {
    TrainerConfig::default()
        .max_opts(max_opts)
        .opt_interval(1)
        .warmup_period(WARMUP_PERIOD)
        .eval_interval(EVAL_INTERVAL)
        .save_interval(SAVE_INTERVAL)
        .record_agent_info_interval(RECORD_INTERVAL)
        .record_compute_cost_interval(RECORD_INTERVAL)
        .flush_record_interval(RECORD_INTERVAL)
        .model_dir(model_dir)
}

/// Trains SAC with `trainer_config`.
///
/// The agent is saved in `model_dir` and the replay buffer in `buffer_path` even if
/// training fails.
fn train(
    config: &Config,
    agent_config: AgentConfig,
    trainer_config: TrainerConfig,
    buffer_config: &SimpleReplayBufferConfig,
    model_dir: &Path,
    buffer_path: &Path,
    logdir: &Path,
) -> Result<()> {
    let env = registry::<MockFdm>()?.make(JSBSIM_V1, config, 0)?;
    let step_proc = StepProc::build(&SimpleStepProcessorConfig::default());
    let mut agent = SacAgent::build(agent_config)?;
    let mut buffer = ReplayBuffer::build(buffer_config);
    let mut evaluator = DefaultEvaluator::from_env(
        registry::<MockFdm>()?.make(JSBSIM_V1, config, 1)?,
        N_EPISODES_PER_EVAL,
    );
    let mut recorder = TensorboardRecorder::new(logdir);
    let mut trainer = Trainer::build(trainer_config);

    let result = trainer.train(
        env,
        step_proc,
        &mut agent,
        &mut buffer,
        &mut recorder,
        &mut evaluator,
    );
    if let Err(e) = &result {
        warn!("Training stopped: {}", e);
    }

    agent.save_params(model_dir)?;
    if let Some(dir) = buffer_path.parent() {
        fs::create_dir_all(dir)?;
    }
    buffer.save(buffer_path)?;
    info!(
        "Saved the model in {:?} and {} transitions in {:?}",
        model_dir,
        buffer.len(),
        buffer_path
    );
    result
}

/// Loads the agent from `model_dir` and flies one episode with the mean action,
/// rendering before every step.
///
/// Returns the number of steps.
fn test_agent(config: &Config, agent_config: AgentConfig, model_dir: &Path) -> Result<usize> {
    let mut agent = SacAgent::build(agent_config)?;
    agent.load_params(model_dir)?;
    agent.eval();

    let mut env = registry::<MockFdm>()?.make(JSBSIM_V1, config, 0)?;
    let mode = config.render_mode.to_string();
    let mut obs = env.reset(None)?;
    let mut n_steps = 0;
    loop {
        env.render(&mode)?;
        let act = agent.sample(&obs)?;
        let (step, _) = env.step(&act)?;
        n_steps += 1;
        if step.is_done() {
            break;
        }
        obs = step.obs;
    }
    env.close();

    info!("Episode finished after {} steps", n_steps);
    Ok(n_steps)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Demo { n_steps } => {
            let config = load_config(args.config.as_deref())?;
            demo(&config, n_steps)?;
        }
        Command::Eval {
            n_episodes,
            constant,
            seed,
            render,
            csv,
        } => {
            let config = load_config(args.config.as_deref())?;
            let mut policy: Box<dyn Policy<Env>> = if constant {
                Box::new(ConstantPolicy(DEMO_ACT.into()))
            } else {
                Box::new(RandomPolicy::new(seed))
            };
            eval(&config, n_episodes, &mut policy, render, csv.as_deref())?;
        }
        Command::Train {
            max_opts,
            model_dir,
            buffer,
            logdir,
            agent_config,
        } => {
            let config = load_config(args.config.as_deref())?;
            let agent_config = load_agent_config(agent_config.as_deref())?;
            let trainer_config = trainer_config(max_opts, &model_dir);
            let buffer_config = SimpleReplayBufferConfig::default().capacity(REPLAY_BUFFER_CAPACITY);
            train(
                &config,
                agent_config,
                trainer_config,
                &buffer_config,
                &model_dir,
                &buffer,
                &logdir,
            )?;
        }
        Command::Test {
            model_dir,
            agent_config,
        } => {
            let config = load_config(args.config.as_deref())?;
            let agent_config = load_agent_config(agent_config.as_deref())?;
            let n_steps = test_agent(&config, agent_config, &model_dir)?;
            println!("{}", n_steps);
        }
        Command::Config { path } => {
            Config::default().save(&path)?;
            info!("Saved default config to {:?}", path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use jsbsim_gym_env::TacviewConfig;
    use std::fs;
    use tempdir::TempDir;

    fn config(dir: &TempDir) -> Config {
        Config::default().tacview(TacviewConfig {
            path: dir.path().join("demo.txt.acmi"),
            ..TacviewConfig::default()
        })
    }

    #[test]
    fn test_demo_records_every_step() -> Result<()> {
        let dir = TempDir::new("jsbsim_gym")?;
        let config = config(&dir);
        let n = demo(&config, 20)?;
        assert_eq!(n, 20);

        let text = fs::read_to_string(dir.path().join("demo.txt.acmi"))?;
        assert_eq!(text.matches("FileVersion=2.1").count(), 1);
        assert_eq!(text.matches("A0100,T=").count(), 20);
        Ok(())
    }

    #[test]
    fn test_eval_writes_csv() -> Result<()> {
        let dir = TempDir::new("jsbsim_gym")?;
        let config = config(&dir).down_sample(60);
        let path = dir.path().join("eval.csv");
        let mut policy = ConstantPolicy(FlightAct::default());

        let returns = eval(&config, 2, &mut policy, false, Some(path.as_path()))?;
        assert_eq!(returns, vec![187.0, 187.0]);

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;
        assert_eq!(rdr.records().count(), 2 * 197);
        Ok(())
    }

    #[test]
    fn test_eval_random_policy_without_csv() -> Result<()> {
        let dir = TempDir::new("jsbsim_gym")?;
        let config = config(&dir).down_sample(60);
        let mut policy = RandomPolicy::new(0);

        let returns = eval(&config, 1, &mut policy, false, None)?;
        assert_eq!(returns.len(), 1);
        Ok(())
    }

    fn small_agent_config() -> AgentConfig {
        let actor_config = ActorConfig::default()
            .pi_config(MlpConfig::new(OBS_DIM, vec![16], ACT_DIM, false));
        let critic_config = CriticConfig::default()
            .q_config(MlpConfig::new(OBS_DIM + ACT_DIM, vec![16], 1, false));
        AgentConfig::default()
            .batch_size(4)
            .actor_config(actor_config)
            .critic_config(critic_config)
    }

    #[test]
    fn test_train_then_fly_trained_agent() -> Result<()> {
        let dir = TempDir::new("jsbsim_gym")?;
        let config = config(&dir).down_sample(60);
        let model_dir = dir.path().join("models").join("jsbsim_sac");
        let buffer_path = dir.path().join("models").join("jsbsim_sac_buffer.bin");
        let buffer_config = SimpleReplayBufferConfig::default().capacity(100);
        let trainer_config = TrainerConfig::default()
            .max_opts(5)
            .warmup_period(4)
            .model_dir(&model_dir);

        train(
            &config,
            small_agent_config(),
            trainer_config,
            &buffer_config,
            &model_dir,
            &buffer_path,
            &dir.path().join("logs"),
        )?;
        assert!(model_dir.join("pi.pt").exists());
        assert!(model_dir.join("qnet_1.pt").exists());

        // Optimization starts at the fourth environment step.
        let mut buffer = ReplayBuffer::build(&buffer_config);
        buffer.load(&buffer_path)?;
        assert_eq!(buffer.len(), 8);

        let n_steps = test_agent(&config, small_agent_config(), &model_dir)?;
        assert!((1..=1200).contains(&n_steps));
        let text = fs::read_to_string(dir.path().join("demo.txt.acmi"))?;
        assert_eq!(text.matches("A0100,T=").count(), n_steps);
        Ok(())
    }

    #[test]
    fn test_agent_needs_a_trained_model() -> Result<()> {
        let dir = TempDir::new("jsbsim_gym")?;
        let config = config(&dir);
        assert!(test_agent(&config, small_agent_config(), &dir.path().join("missing")).is_err());
        Ok(())
    }

    #[test]
    fn test_default_agent_config_matches_env() -> Result<()> {
        let agent_config = load_agent_config(None)?;
        let pi_config = agent_config
            .actor_config
            .pi_config
            .as_ref()
            .expect("pi_config is set");
        assert_eq!(pi_config.in_dim(), OBS_DIM);

        let dir = TempDir::new("jsbsim_gym")?;
        let path = dir.path().join("sac.yaml");
        agent_config.save(&path)?;
        assert_eq!(load_agent_config(Some(path.as_path()))?, agent_config);
        Ok(())
    }

    #[test]
    fn test_config_round_trip() -> Result<()> {
        let dir = TempDir::new("jsbsim_gym")?;
        let path = dir.path().join("jsbsim_gym.yaml");
        Config::default().save(&path)?;
        assert_eq!(load_config(Some(path.as_path()))?, Config::default());
        Ok(())
    }
}
