/// Assembly stage definitions for tracking a single entity's multi-hop build
///
/// Every question or answer moves through the same sequence of hops. The
/// stages are only ever advanced forward; `StageTracker` rejects anything else.
use crate::ScrapeError;
use std::fmt;

/// Represents the current stage of one entity being assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssemblyStage {
    // ===== Active Stages =====
    /// The entity is a summary card on a listing page
    Listing,

    /// The detail page is fetched (or already in hand for id-scoped requests)
    Detail,

    /// The post's timeline page is fetched
    Timeline,

    /// The owner is being resolved from the timeline / profile pages
    Owner,

    /// The post body is extracted (`withbody` filter only)
    BodyExtraction,

    // ===== Terminal Stages =====
    /// The record is complete
    Assembled,

    /// The record was dropped on purpose (id mismatch on an id-scoped request)
    Discarded,

    /// A hop failed; the entity is excluded from the batch
    Failed,
}

impl AssemblyStage {
    /// Returns true if this is a terminal stage
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Assembled | Self::Discarded | Self::Failed)
    }

    /// Returns true if the stage may be followed by `next`
    ///
    /// The listing hop is optional (id-scoped requests start at `Detail`) and
    /// body extraction only happens for `withbody`, so both may be skipped.
    /// Any active stage may end in `Discarded` or `Failed`.
    pub fn can_transition_to(&self, next: AssemblyStage) -> bool {
        use AssemblyStage::*;

        if self.is_terminal() {
            return false;
        }

        match (self, next) {
            (_, Discarded) | (_, Failed) => true,
            (Listing, Detail) => true,
            (Detail, Timeline) => true,
            (Timeline, Owner) => true,
            (Owner, BodyExtraction) | (Owner, Assembled) => true,
            (BodyExtraction, Assembled) => true,
            _ => false,
        }
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Detail => "detail",
            Self::Timeline => "timeline",
            Self::Owner => "owner",
            Self::BodyExtraction => "body_extraction",
            Self::Assembled => "assembled",
            Self::Discarded => "discarded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AssemblyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the stage of one entity and traces each hop
#[derive(Debug, Clone)]
pub struct StageTracker {
    entity: String,
    stage: AssemblyStage,
}

impl StageTracker {
    /// Starts tracking `entity` at `stage`
    pub fn new(entity: impl Into<String>, stage: AssemblyStage) -> Self {
        let entity = entity.into();
        tracing::trace!(entity = %entity, stage = %stage, "assembly started");
        Self { entity, stage }
    }

    /// Current stage
    pub fn stage(&self) -> AssemblyStage {
        self.stage
    }

    /// Moves to `next`, failing on a backwards or skipped hop
    pub fn advance(&mut self, next: AssemblyStage) -> Result<(), ScrapeError> {
        if !self.stage.can_transition_to(next) {
            return Err(ScrapeError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }

        tracing::trace!(entity = %self.entity, from = %self.stage, to = %next, "assembly hop");
        self.stage = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!AssemblyStage::Listing.is_terminal());
        assert!(!AssemblyStage::Detail.is_terminal());
        assert!(!AssemblyStage::Timeline.is_terminal());
        assert!(!AssemblyStage::Owner.is_terminal());
        assert!(!AssemblyStage::BodyExtraction.is_terminal());

        assert!(AssemblyStage::Assembled.is_terminal());
        assert!(AssemblyStage::Discarded.is_terminal());
        assert!(AssemblyStage::Failed.is_terminal());
    }

    #[test]
    fn test_forward_path() {
        use AssemblyStage::*;
        assert!(Listing.can_transition_to(Detail));
        assert!(Detail.can_transition_to(Timeline));
        assert!(Timeline.can_transition_to(Owner));
        assert!(Owner.can_transition_to(BodyExtraction));
        assert!(Owner.can_transition_to(Assembled));
        assert!(BodyExtraction.can_transition_to(Assembled));
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        use AssemblyStage::*;
        assert!(!Detail.can_transition_to(Owner));
        assert!(!Timeline.can_transition_to(Detail));
        assert!(!Listing.can_transition_to(Assembled));
        assert!(!Assembled.can_transition_to(Failed));
    }

    #[test]
    fn test_tracker_rejects_invalid_hop() {
        let mut tracker = StageTracker::new("question 1", AssemblyStage::Detail);
        assert!(tracker.advance(AssemblyStage::Timeline).is_ok());

        let err = tracker.advance(AssemblyStage::Detail).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::InvalidTransition {
                from: AssemblyStage::Timeline,
                to: AssemblyStage::Detail
            }
        ));
        assert_eq!(tracker.stage(), AssemblyStage::Timeline);
    }

    #[test]
    fn test_display() {
        assert_eq!(AssemblyStage::BodyExtraction.to_string(), "body_extraction");
        assert_eq!(AssemblyStage::Owner.to_string(), "owner");
    }
}
