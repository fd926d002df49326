use rand::prelude::*;

use super::job::{Burst, Job};
use crate::{
    config::{Span, WorkloadConfig},
    error::SimError,
};

/// Random jobs whose bursts alternate CPU, IO, CPU, ... Later CPU bursts
/// either release part of the memory held so far or grow it by up to
/// `max_growth`, on a fair coin.
pub fn generate(config: &WorkloadConfig) -> Result<Vec<Job>, SimError> {
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let count = draw(&mut rng, config.jobs);
    (0..count)
        .map(|_| {
            let bursts = job_bursts(&mut rng, config);
            let name = format!("Program {}", rng.random_range(0..count.max(1)));
            Job::new(name, bursts)
        })
        .collect()
}

fn job_bursts(rng: &mut StdRng, config: &WorkloadConfig) -> Vec<Burst> {
    let count = draw(rng, config.bursts).max(1);
    let initial = draw(rng, config.initial_memory);
    let mut bursts = Vec::with_capacity(count as usize);
    bursts.push(Burst::cpu(draw(rng, config.cpu_burst), initial as i64));

    let mut held = initial;
    for index in 1..count {
        if index % 2 == 1 {
            bursts.push(Burst::io(draw(rng, config.io_burst)));
            continue;
        }

        let delta = if held > 0 && rng.random_bool(0.5) {
            -(rng.random_range(0..held) as i64)
        } else {
            rng.random_range(0..=config.max_growth) as i64
        };
        held = held.saturating_add_signed(delta);
        bursts.push(Burst::cpu(draw(rng, config.cpu_burst), delta));
    }
    bursts
}

fn draw(rng: &mut StdRng, span: Span) -> u64 {
    rng.random_range(span.min..=span.max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> WorkloadConfig {
        WorkloadConfig {
            seed: Some(seed),
            ..WorkloadConfig::default()
        }
    }

    #[test]
    fn respects_configured_ranges() {
        let config = seeded(11);
        let jobs = generate(&config).unwrap();
        assert!((5..=14).contains(&jobs.len()));

        for job in &jobs {
            assert!((1..=10).contains(&job.burst_count()));
            assert!((5..=200).contains(&job.memory_required()));
            assert!(job.current().is_cpu());
        }
    }

    #[test]
    fn bursts_alternate_cpu_and_io() {
        let mut job = generate(&seeded(3)).unwrap().into_iter().max_by_key(Job::burst_count).unwrap();
        let mut expect_cpu = true;
        loop {
            let burst = job.current();
            assert_eq!(burst.is_cpu(), expect_cpu);
            if burst.is_cpu() {
                assert!((10..=100).contains(&burst.duration()));
            } else {
                assert!((20..=60).contains(&burst.duration()));
            }
            if job.is_last_burst() {
                break;
            }
            job.advance();
            expect_cpu = !expect_cpu;
        }
    }

    #[test]
    fn same_seed_same_workload() {
        let a = generate(&seeded(99)).unwrap();
        let b = generate(&seeded(99)).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.name(), y.name());
            assert_eq!(x.burst_count(), y.burst_count());
            assert_eq!(x.total_cpu_time(), y.total_cpu_time());
            assert_eq!(x.memory_required(), y.memory_required());
        }
    }

    #[test]
    fn rejects_unusable_ranges() {
        let mut config = seeded(1);
        config.cpu_burst = Span::new(0, 5);
        assert!(matches!(generate(&config), Err(SimError::Config(_))));

        let mut config = seeded(1);
        config.io_burst = Span::new(9, 3);
        assert!(matches!(generate(&config), Err(SimError::Config(_))));
    }
}
