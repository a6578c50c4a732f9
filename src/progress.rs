//! Human-readable progress lines printed on every improvement.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Progress {
    enabled: bool,
}

impl Progress {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub(crate) fn header(&self, objective_label: &str) {
        if self.enabled {
            eprintln!("{:<30}{:<15}{:<15}", objective_label, "n_iter", "cpu_time");
        }
    }

    pub(crate) fn report(&self, objective: f64, n_iter: usize, elapsed: Duration) {
        if self.enabled {
            eprintln!("{}", format_line(objective, n_iter, elapsed));
        }
    }
}

fn format_line(objective: f64, n_iter: usize, elapsed: Duration) -> String {
    format!("{:<30.6}{:<15}{:<15.2}", objective, n_iter, elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_columns() {
        let line = format_line(12.5, 7, Duration::from_millis(1250));
        assert_eq!(&line[..30], format!("{:<30}", "12.500000"));
        assert_eq!(&line[30..45], format!("{:<15}", "7"));
        assert!(line[45..].starts_with("1.25"));
    }
}
