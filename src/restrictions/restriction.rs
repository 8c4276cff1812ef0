use std::fmt;
use std::sync::Arc;

/// Admission policy for a group of tasks sharing a restriction key.
///
/// `max_connection_count == 0` means the restriction declares no ceiling of its own;
/// the manager then applies its global per-host default
/// ([`ManagerConfig::max_connection_count_per_host`](crate::ManagerConfig::max_connection_count_per_host)).
///
/// ## Example
/// ```rust
/// use queuevisor::Restriction;
///
/// let open = Restriction::unrestricted("cdn.example.com");
/// assert!(!open.is_restricted());
/// assert_eq!(open.effective_max(3), 3);
///
/// let strict = Restriction::new("slow.example.com", 1);
/// assert!(strict.is_restricted());
/// assert_eq!(strict.effective_max(3), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Restriction {
    key: Arc<str>,
    max_connection_count: usize,
}

impl Restriction {
    /// Creates a restriction with an explicit per-key ceiling (`0` = use the default).
    pub fn new(key: impl Into<Arc<str>>, max_connection_count: usize) -> Self {
        Self {
            key: key.into(),
            max_connection_count,
        }
    }

    /// Creates a restriction that defers to the manager's per-host default.
    pub fn unrestricted(key: impl Into<Arc<str>>) -> Self {
        Self::new(key, 0)
    }

    /// Returns the restriction key.
    pub fn restriction_key(&self) -> &str {
        &self.key
    }

    pub(crate) fn key_arc(&self) -> &Arc<str> {
        &self.key
    }

    /// Returns the declared per-key ceiling (`0` = none declared).
    pub fn max_connection_count(&self) -> usize {
        self.max_connection_count
    }

    /// `true` when the restriction declares its own ceiling.
    pub fn is_restricted(&self) -> bool {
        self.max_connection_count > 0
    }

    /// Ceiling actually enforced for this key given the manager's per-host default.
    #[inline]
    pub fn effective_max(&self, default_per_host: usize) -> usize {
        if self.is_restricted() {
            self.max_connection_count
        } else {
            default_per_host
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_restricted() {
            write!(f, "{} (max {})", self.key, self.max_connection_count)
        } else {
            write!(f, "{} (default)", self.key)
        }
    }
}
