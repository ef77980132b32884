//! One-shot timers for the lifecycle transitions.
//!
//! The controller never sleeps; it arms a [`Task`] and the host hands the task
//! back when it comes due. Browsers use `setTimeout`, tests use [`ManualTimer`].

/// Deferred work the controller asks its host to run later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// End of play `play`: back to idle and release its graph.
    Release { play: u64 },
    /// Start the play queued by a surprise draw.
    AutoPlay,
}

pub trait Timer {
    fn arm(&mut self, delay_ms: u32, task: Task);
}

/// Timer driven by hand: time only moves when [`ManualTimer::advance`] is called.
#[derive(Debug, Default)]
pub struct ManualTimer {
    now_ms: u64,
    seq: u64,
    pending: Vec<Pending>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    due_ms: u64,
    seq: u64,
    task: Task,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Armed tasks with their due times, earliest first.
    pub fn pending(&self) -> Vec<(u64, Task)> {
        let mut pending = self.pending.clone();
        pending.sort_by_key(|p| (p.due_ms, p.seq));
        pending.into_iter().map(|p| (p.due_ms, p.task)).collect()
    }

    /// Moves time forward by `ms` and returns the tasks that came due, in firing order.
    pub fn advance(&mut self, ms: u64) -> Vec<Task> {
        self.now_ms += ms;
        let now = self.now_ms;
        let (mut due, later): (Vec<Pending>, Vec<Pending>) =
            self.pending.iter().partition(|p| p.due_ms <= now);
        self.pending = later;
        due.sort_by_key(|p| (p.due_ms, p.seq));
        due.into_iter().map(|p| p.task).collect()
    }
}

impl Timer for ManualTimer {
    fn arm(&mut self, delay_ms: u32, task: Task) {
        self.seq += 1;
        self.pending.push(Pending {
            due_ms: self.now_ms + delay_ms as u64,
            seq: self.seq,
            task,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_fire_when_due() {
        let mut timer = ManualTimer::new();
        timer.arm(300, Task::AutoPlay);
        timer.arm(2100, Task::Release { play: 1 });

        assert!(timer.advance(299).is_empty());
        assert_eq!(timer.advance(1), vec![Task::AutoPlay]);
        assert_eq!(timer.pending(), vec![(2100, Task::Release { play: 1 })]);
        assert_eq!(timer.advance(5000), vec![Task::Release { play: 1 }]);
        assert!(timer.pending().is_empty());
    }

    #[test]
    fn test_same_deadline_keeps_arm_order() {
        let mut timer = ManualTimer::new();
        timer.arm(100, Task::Release { play: 2 });
        timer.arm(100, Task::AutoPlay);
        assert_eq!(
            timer.advance(100),
            vec![Task::Release { play: 2 }, Task::AutoPlay]
        );
    }
}
