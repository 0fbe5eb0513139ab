//! Dispatcher configuration

/// Decides which calls count as notifications and therefore get no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPolicy {
    /// A missing id or an id of `0` marks a notification (legacy behavior)
    #[default]
    AbsentOrZero,
    /// Only a missing (or null) id marks a notification; `0` is a normal id
    AbsentOnly,
}

impl NotificationPolicy {
    pub fn is_notification(&self, id: Option<i64>) -> bool {
        match self {
            NotificationPolicy::AbsentOrZero => matches!(id, None | Some(0)),
            NotificationPolicy::AbsentOnly => id.is_none(),
        }
    }
}

/// How the elements of a batch are executed.
///
/// Replies are always assembled in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// One element at a time, in input order
    #[default]
    Sequential,
    /// All elements polled concurrently
    Concurrent,
}

/// Configuration for a [`Dispatcher`](crate::Dispatcher)
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    pub notification_policy: NotificationPolicy,
    pub batch_mode: BatchMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatcherConfig::default();
        assert_eq!(config.notification_policy, NotificationPolicy::AbsentOrZero);
        assert_eq!(config.batch_mode, BatchMode::Sequential);
    }

    #[test]
    fn test_notification_policies() {
        let legacy = NotificationPolicy::AbsentOrZero;
        assert!(legacy.is_notification(None));
        assert!(legacy.is_notification(Some(0)));
        assert!(!legacy.is_notification(Some(1)));
        assert!(!legacy.is_notification(Some(-1)));

        let strict = NotificationPolicy::AbsentOnly;
        assert!(strict.is_notification(None));
        assert!(!strict.is_notification(Some(0)));
    }
}
