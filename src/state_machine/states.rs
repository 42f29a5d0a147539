use serde::{Deserialize, Serialize};
use std::fmt;

/// Document-level routing state over one routing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStatus {
    /// Initial state before any routing cycle has started
    NotRouted,
    /// Document has been handed to its reviewers
    RoutedForReview,
    /// Every reviewer finished; waiting on the initiator
    ReviewComplete,
    /// Document forwarded to the approver phase
    RoutedToApprover,
    /// Routing finished end to end
    RoutingComplete,
    /// Approver rejected the document
    RejectedByApprover,
    /// A reviewer rejected the document
    RejectedByReviewer,
}

impl RoutingStatus {
    /// Check if this is a terminal state (no further routing transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RoutingComplete | Self::RejectedByApprover | Self::RejectedByReviewer
        )
    }

    /// Check if a routing cycle is underway (routing type must not change)
    pub fn is_cycle_active(&self) -> bool {
        matches!(
            self,
            Self::RoutedForReview | Self::ReviewComplete | Self::RoutedToApprover
        )
    }
}

impl fmt::Display for RoutingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRouted => write!(f, "not_routed"),
            Self::RoutedForReview => write!(f, "routed_for_review"),
            Self::ReviewComplete => write!(f, "review_complete"),
            Self::RoutedToApprover => write!(f, "routed_to_approver"),
            Self::RoutingComplete => write!(f, "routing_complete"),
            Self::RejectedByApprover => write!(f, "rejected_by_approver"),
            Self::RejectedByReviewer => write!(f, "rejected_by_reviewer"),
        }
    }
}

impl std::str::FromStr for RoutingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_routed" => Ok(Self::NotRouted),
            "routed_for_review" => Ok(Self::RoutedForReview),
            "review_complete" => Ok(Self::ReviewComplete),
            "routed_to_approver" => Ok(Self::RoutedToApprover),
            "routing_complete" => Ok(Self::RoutingComplete),
            "rejected_by_approver" => Ok(Self::RejectedByApprover),
            "rejected_by_reviewer" => Ok(Self::RejectedByReviewer),
            _ => Err(format!("Invalid routing status: {s}")),
        }
    }
}

/// Document-level workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Initial state when the document is created
    NotStarted,
    /// Workflow is running
    InProgress,
    /// Serial review chain is waiting on the active reviewer
    SerialReviewPending,
    /// All reviewers done; initiator must act next
    PendingInitiatorAction,
    /// Workflow was terminated (rejection path)
    Terminated,
    /// Workflow finished successfully
    Completed,
}

impl WorkflowStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated | Self::Completed)
    }

    /// Check if the workflow is actively driving reviewers
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress | Self::SerialReviewPending)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress => write!(f, "in_progress"),
            Self::SerialReviewPending => write!(f, "serial_review_pending"),
            Self::PendingInitiatorAction => write!(f, "pending_initiator_action"),
            Self::Terminated => write!(f, "terminated"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "serial_review_pending" => Ok(Self::SerialReviewPending),
            "pending_initiator_action" => Ok(Self::PendingInitiatorAction),
            "terminated" => Ok(Self::Terminated),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid workflow status: {s}")),
        }
    }
}

/// Per-reviewer lifecycle state within one routing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    /// Assignment exists but the reviewer has not been activated
    NotStarted,
    /// Reviewer holds the assignment and must act
    IsPending,
    /// Reviewer approved
    Complete,
    /// Reviewer rejected
    Rejected,
}

impl DistributionStatus {
    /// Check if this is a terminal state for the assignment
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Rejected)
    }

    /// Check if the assignment is the active one awaiting review
    pub fn is_active(&self) -> bool {
        matches!(self, Self::IsPending)
    }
}

impl fmt::Display for DistributionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::IsPending => write!(f, "is_pending"),
            Self::Complete => write!(f, "complete"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for DistributionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "is_pending" => Ok(Self::IsPending),
            "complete" => Ok(Self::Complete),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Invalid distribution status: {s}")),
        }
    }
}

/// How reviewers are driven through a routing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingType {
    /// Reviewers act one at a time in ordinal sequence
    Serial,
    /// All reviewers act simultaneously
    Parallel,
}

impl fmt::Display for RoutingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "serial"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

impl std::str::FromStr for RoutingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serial" => Ok(Self::Serial),
            "parallel" => Ok(Self::Parallel),
            _ => Err(format!("Invalid routing type: {s}")),
        }
    }
}

/// Soft-delete state carried by every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Active,
    Inactive,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for RecordState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("Invalid record state: {s}")),
        }
    }
}

/// Default state for new documents
impl Default for RoutingStatus {
    fn default() -> Self {
        Self::NotRouted
    }
}

impl Default for WorkflowStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// Default state for new review assignments
impl Default for DistributionStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl Default for RecordState {
    fn default() -> Self {
        Self::Active
    }
}
