use std::time::Duration;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(350);

/// Debounce bookkeeping without a timer of its own.
///
/// Every input gets a ticket from [`Debouncer::push`]. The caller waits out
/// the quiet period and then calls [`Debouncer::settle`] with its ticket;
/// only the newest ticket yields a value, and never the same value twice in
/// a row.
#[derive(Debug, Default)]
pub struct Debouncer {
    ticket: u64,
    pending: Option<String>,
    last_emitted: Option<String>,
}

impl Debouncer {
    pub fn push(&mut self, value: String) -> u64 {
        self.ticket += 1;
        self.pending = Some(value);
        self.ticket
    }

    pub fn settle(&mut self, ticket: u64) -> Option<String> {
        if ticket != self.ticket {
            return None;
        }
        let value = self.pending.take()?;
        if self.last_emitted.as_deref() == Some(value.as_str()) {
            return None;
        }
        self.last_emitted = Some(value.clone());
        Some(value)
    }

    /// Emits immediately, dropping whatever was waiting.
    pub fn flush(&mut self, value: String) -> bool {
        self.ticket += 1;
        self.pending = None;
        if self.last_emitted.as_deref() == Some(value.as_str()) {
            return false;
        }
        self.last_emitted = Some(value);
        true
    }

    /// Forgets the last emitted value so the next one counts as new.
    pub fn reset_emitted(&mut self) {
        self.last_emitted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_ticket_emits() {
        let mut d = Debouncer::default();
        let first = d.push("ba".to_string());
        let second = d.push("bat".to_string());
        assert_eq!(d.settle(first), None);
        assert_eq!(d.settle(second).as_deref(), Some("bat"));
        assert_eq!(d.settle(second), None);
    }

    #[test]
    fn identical_consecutive_values_emit_once() {
        let mut d = Debouncer::default();
        let t = d.push("matrix".to_string());
        assert_eq!(d.settle(t).as_deref(), Some("matrix"));
        let t = d.push("matri".to_string());
        let t2 = d.push("matrix".to_string());
        assert_eq!(d.settle(t), None);
        assert_eq!(d.settle(t2), None);
        let t = d.push("matrix 2".to_string());
        assert_eq!(d.settle(t).as_deref(), Some("matrix 2"));
    }

    #[test]
    fn flush_cancels_pending_and_counts_as_emitted() {
        let mut d = Debouncer::default();
        let t = d.push("alien".to_string());
        assert!(d.flush("alien".to_string()));
        assert_eq!(d.settle(t), None);
        assert!(!d.flush("alien".to_string()));
        let t = d.push("alien".to_string());
        assert_eq!(d.settle(t), None);
    }

    #[test]
    fn reset_lets_the_last_value_through_again() {
        let mut d = Debouncer::default();
        let t = d.push("alien".to_string());
        assert_eq!(d.settle(t).as_deref(), Some("alien"));
        d.reset_emitted();
        let t = d.push("alien".to_string());
        assert_eq!(d.settle(t).as_deref(), Some("alien"));
        d.reset_emitted();
        assert!(d.flush("alien".to_string()));
    }
}
