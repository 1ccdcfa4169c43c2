//! Frame batch driver.
//!
//! The batch driver runs the iterations of a message passing [`Schedule`] over
//! a batch of independent frames that share the same Tanner graph and check
//! node update rule. Each frame has its own [`SyndromeCriterion`]. A frame
//! that meets its stop criterion is frozen while the rest of the batch keeps
//! iterating, so the result for each frame is the same as if it had been
//! decoded alone. The batch stops when all the frames have stopped or when the
//! maximum number of iterations is reached.

use super::{syndrome::SyndromeCriterion, DecoderConfig, FrameStatus};

/// Message passing schedule.
///
/// This is implemented by the flooding and layered decoders, which own the
/// message buffers of all the frames in the batch.
pub trait Schedule {
    /// Performs one decoding iteration on a frame.
    ///
    /// Returns `true` if all the parity checks were satisfied during the
    /// iteration.
    fn iterate(&mut self, frame: usize) -> bool;

    /// Updates the a-posteriori LLRs of a frame after the last iteration.
    fn finish(&mut self, frame: usize);
}

/// Decodes a batch of frames.
///
/// The schedule must have been initialized with the intrinsic LLRs of
/// `config.batch_size` frames. Returns the status of each frame.
pub fn run_batch<S: Schedule>(schedule: &mut S, config: &DecoderConfig) -> Vec<FrameStatus> {
    let batch_size = config.batch_size;
    let mut criteria = vec![
        SyndromeCriterion::new(config.enable_syndrome, config.syndrome_depth);
        batch_size
    ];
    let mut status = vec![FrameStatus::default(); batch_size];
    let mut active = (0..batch_size).collect::<Vec<_>>();
    for iteration in 1..=config.max_iterations {
        active.retain(|&frame| {
            let satisfied = schedule.iterate(frame);
            let stop = criteria[frame].update(satisfied);
            status[frame] = FrameStatus {
                iterations: iteration,
                converged: if config.enable_syndrome {
                    stop
                } else {
                    satisfied
                },
            };
            !stop
        });
        tracing::trace!(iteration, active = active.len(), "decoder iteration");
        if active.is_empty() {
            break;
        }
    }
    for frame in 0..batch_size {
        schedule.finish(frame);
    }
    status
}

#[cfg(test)]
mod test {
    use super::*;

    // A fake schedule replaying a fixed syndrome sequence per frame.
    struct Replay {
        syndromes: Vec<Vec<bool>>,
        calls: Vec<usize>,
        finished: Vec<bool>,
    }

    impl Replay {
        fn new(syndromes: Vec<Vec<bool>>) -> Replay {
            let n = syndromes.len();
            Replay {
                syndromes,
                calls: vec![0; n],
                finished: vec![false; n],
            }
        }
    }

    impl Schedule for Replay {
        fn iterate(&mut self, frame: usize) -> bool {
            let s = self.syndromes[frame][self.calls[frame]];
            self.calls[frame] += 1;
            s
        }

        fn finish(&mut self, frame: usize) {
            self.finished[frame] = true;
        }
    }

    #[test]
    fn frames_stop_independently() {
        let config = DecoderConfig::default()
            .with_max_iterations(5)
            .with_syndrome_depth(2)
            .with_batch_size(3);
        let mut replay = Replay::new(vec![
            vec![true, true, true, true, true],
            vec![true, false, true, true, true],
            vec![false, true, false, true, false],
        ]);
        let status = run_batch(&mut replay, &config);
        assert_eq!(
            status,
            vec![
                FrameStatus {
                    iterations: 2,
                    converged: true
                },
                FrameStatus {
                    iterations: 4,
                    converged: true
                },
                FrameStatus {
                    iterations: 5,
                    converged: false
                },
            ]
        );
        // stopped frames are not iterated any more
        assert_eq!(replay.calls, vec![2, 4, 5]);
        assert!(replay.finished.iter().all(|&f| f));
    }

    #[test]
    fn disabled_syndrome_runs_all_iterations() {
        let config = DecoderConfig::default()
            .with_max_iterations(3)
            .with_syndrome(false);
        let mut replay = Replay::new(vec![vec![true, false, true]]);
        let status = run_batch(&mut replay, &config);
        assert_eq!(replay.calls, vec![3]);
        assert_eq!(
            status,
            vec![FrameStatus {
                iterations: 3,
                converged: true
            }]
        );
    }
}
