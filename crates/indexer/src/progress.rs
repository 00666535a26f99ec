use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;


#[derive(Clone, Copy, Debug)]
struct Sample {
    value: u64,
    time: Instant
}


/// Sliding window rate meter over a monotonically growing counter.
///
/// Samples closer than `granularity` to the previous one overwrite it,
/// so the window always spans roughly `window_size * granularity`.
pub struct Progress {
    window: VecDeque<Sample>,
    window_size: usize,
    granularity: Duration,
    has_news: bool
}


impl Progress {
    pub fn new(window_size: usize, granularity: Duration) -> Self {
        assert!(window_size > 0);
        assert!(!granularity.is_zero());
        Self {
            window: VecDeque::with_capacity(window_size + 1),
            window_size,
            granularity,
            has_news: false
        }
    }

    pub fn set_current_value(&mut self, value: u64) {
        let time = Instant::now();
        self.has_news = true;

        let Some(last) = self.window.back_mut() else {
            self.window.push_back(Sample { value, time });
            return
        };

        let value = value.max(last.value);

        if self.window.len() > 1 && time <= last.time + self.granularity {
            last.value = value;
            return
        }

        self.window.push_back(Sample { value, time });
        if self.window.len() > self.window_size + 1 {
            self.window.pop_front();
        }
    }

    pub fn current_value(&self) -> u64 {
        self.window.back().map_or(0, |s| s.value)
    }

    pub fn has_news(&self) -> bool {
        self.has_news
    }

    /// Units per second over the window, resets [Progress::has_news].
    pub fn speed(&mut self) -> f64 {
        self.has_news = false;
        let (Some(beg), Some(end)) = (self.window.front(), self.window.back()) else {
            return 0.0
        };
        let duration = end.time.duration_since(beg.time).as_secs_f64();
        if duration == 0.0 {
            return 0.0
        }
        (end.value - beg.value) as f64 / duration
    }
}


#[cfg(test)]
mod test {
    use super::*;


    #[tokio::test(start_paused = true)]
    async fn speed_over_window() {
        let mut progress = Progress::new(3, Duration::from_secs(1));
        assert_eq!(progress.speed(), 0.0);

        progress.set_current_value(0);
        assert_eq!(progress.speed(), 0.0);

        for i in 1..=5 {
            tokio::time::advance(Duration::from_secs(2)).await;
            progress.set_current_value(i * 10);
        }
        assert!(progress.has_news());
        // window holds values 20..=50 spread over 6 seconds
        assert_eq!(progress.speed(), 5.0);
        assert!(!progress.has_news());
        assert_eq!(progress.current_value(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn close_samples_are_merged() {
        let mut progress = Progress::new(10, Duration::from_secs(1));
        progress.set_current_value(0);
        tokio::time::advance(Duration::from_secs(2)).await;
        progress.set_current_value(10);
        tokio::time::advance(Duration::from_millis(500)).await;
        progress.set_current_value(20);
        assert_eq!(progress.current_value(), 20);
        assert_eq!(progress.speed(), 10.0);
    }
}
