//! Utilities for interaction of policies and environments.
use crate::{
    record::{RecordValue, Recorder},
    Env, Policy,
};
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Reads a configuration from a YAML file.
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path)?;
    let rdr = BufReader::new(file);
    let config = serde_yaml::from_reader(rdr)?;
    Ok(config)
}

/// Writes a configuration to a YAML file.
pub fn save_yaml<T: Serialize>(config: &T, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(serde_yaml::to_string(config)?.as_bytes())?;
    Ok(())
}

/// Run episodes with a policy and write a record per step to `recorder`.
///
/// Each record is the one returned by [`Env::step`] extended with `reward`,
/// `episode` and `step` entries, including the step that ends the episode.
/// When `render_mode` is given, the environment is rendered after every step.
///
/// Returns the return of each episode.
pub fn eval_with_recorder<E, P, R>(
    env: &mut E,
    policy: &mut P,
    n_episodes: usize,
    render_mode: Option<&str>,
    recorder: &mut R,
) -> Result<Vec<f32>>
where
    E: Env,
    P: Policy<E>,
    R: Recorder,
{
    let mut rs = Vec::new();

    for episode in 0..n_episodes {
        let mut prev_obs = env.reset_with_index(episode)?;
        let mut count_step = 0;
        let mut r_total = 0.0;

        loop {
            let act = policy.sample(&prev_obs)?;
            let (step, mut record) = env.step(&act)?;
            if let Some(mode) = render_mode {
                env.render(mode)?;
            }
            r_total += step.reward;

            record.insert("reward", RecordValue::Scalar(step.reward));
            record.insert("episode", RecordValue::Scalar(episode as _));
            record.insert("step", RecordValue::Scalar(count_step as _));
            recorder.write(record);
            count_step += 1;

            if step.is_done() {
                break;
            }
            prev_obs = step.obs;
        }

        info!(
            "Episode {:?}, {:?} steps, reward = {:?}",
            episode, count_step, r_total
        );
        rs.push(r_total);
    }
    recorder.flush();

    Ok(rs)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dummy::{CountdownAct, CountdownConfig, CountdownEnv, CountdownObs};
    use crate::record::BufferedRecorder;
    use serde::Deserialize;
    use tempdir::TempDir;

    struct Twice;

    impl Policy<CountdownEnv> for Twice {
        fn sample(&mut self, _obs: &CountdownObs) -> Result<CountdownAct> {
            Ok(CountdownAct(2))
        }
    }

    #[test]
    fn test_records_every_step() -> Result<()> {
        let mut env = CountdownEnv::build(&CountdownConfig { start: 5 }, 0)?;
        let mut recorder = BufferedRecorder::new();

        let rs = eval_with_recorder(&mut env, &mut Twice, 2, None, &mut recorder)?;

        // 5 -> 3 -> 1 -> -1
        assert_eq!(rs, vec![-1.0, -1.0]);
        assert_eq!(recorder.len(), 6);
        let last = recorder.iter().last().unwrap();
        assert_eq!(last.get_scalar("episode")?, 1.0);
        assert_eq!(last.get_scalar("step")?, 2.0);
        assert_eq!(last.get_scalar("remaining")?, -1.0);
        Ok(())
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct SampleConfig {
        name: String,
        n_steps: usize,
        dt: f64,
    }

    #[test]
    fn test_yaml_round_trip() -> Result<()> {
        let dir = TempDir::new("util")?;
        let path = dir.path().join("config.yaml");
        let config = SampleConfig {
            name: "JSBSim-v1".to_string(),
            n_steps: 1200,
            dt: 1.0 / 60.0,
        };
        save_yaml(&config, &path)?;
        assert_eq!(load_yaml::<SampleConfig>(&path)?, config);
        assert!(load_yaml::<SampleConfig>(dir.path().join("missing.yaml")).is_err());
        Ok(())
    }
}
