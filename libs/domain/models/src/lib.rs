
pub mod contact;
pub mod entity;
pub mod ledger;
pub mod permit;
pub mod query;
pub mod relationship;
pub mod routing;
pub mod signals;
pub mod velocity;

pub use contact::{Contact, ContactRole, ContactSource};
pub use entity::{Entity, ResolutionConfidence, ResolutionMethod};
pub use ledger::{CronLogRow, IngestLogRow, StepStatus};
pub use permit::{Inspection, Permit, Violation};
pub use query::{
    AnomalyEntry, AnomalyReport, ClusterReport, CoOccurrence, EntitySearchHit,
    EstimateConfidence, NetworkEdge, NetworkGraph, NetworkNode, PermitSummary, PlaybookStep,
    PlaybookUrgency, PropertyHealthSummary, QueryError, StationDiagnosis, StationEstimate,
    StationPace, StuckPermitDiagnosis, TimelineEstimate,
};
pub use relationship::Relationship;
pub use routing::{AddendaRouting, CycleType};
pub use signals::{HealthTier, PermitSignals, PropertySignals, SignalEvidence, SignalKind};
pub use velocity::{BaselinePeriod, TrendVerdict, VelocityBaseline};
