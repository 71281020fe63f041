//! Interface through which retention policy is applied to a merged table.
//!
//! Deciding *what* expires is up to the implementation; the compactor only
//! reacts to the returned [`RetentionDecision`].

use redb::Database;

/// Boxed error returned by a marker.
pub type RetentionError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of applying retention to one merged table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionDecision {
    /// Every record is expired; the whole table should be removed.
    pub empty: bool,
    /// The marker removed entries from the merged database in place.
    pub modified: bool,
}

impl RetentionDecision {
    /// Nothing expired.
    pub const UNCHANGED: Self = RetentionDecision {
        empty: false,
        modified: false,
    };

    /// Some entries were deleted from the merged database.
    pub const MODIFIED: Self = RetentionDecision {
        empty: false,
        modified: true,
    };

    /// The table is entirely expired.
    pub const EMPTY: Self = RetentionDecision {
        empty: true,
        modified: true,
    };
}

/// Applies retention policy to a table's merged database.
///
/// Called at most once per run, from a blocking thread, with exclusive access to
/// the merged file. Implementations may delete entries through `db`; they must
/// report that through [`RetentionDecision::modified`].
pub trait RetentionMarker: Send + Sync {
    /// Mark expired entries of `table_name` for deletion.
    fn mark_for_delete(
        &self,
        table_name: &str,
        db: &Database,
    ) -> Result<RetentionDecision, RetentionError>;
}

/// Adapter turning a closure into a [`RetentionMarker`].
pub struct MarkerFn<F>(pub F);

impl<F> RetentionMarker for MarkerFn<F>
where
    F: Fn(&str, &Database) -> Result<RetentionDecision, RetentionError> + Send + Sync,
{
    fn mark_for_delete(
        &self,
        table_name: &str,
        db: &Database,
    ) -> Result<RetentionDecision, RetentionError> {
        (self.0)(table_name, db)
    }
}
