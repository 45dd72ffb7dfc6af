//! Error types for the hdcluster core library.
//!
//! Construction failures are reported through [`MergeTreeError`]; failures
//! while condensing, selecting, or exporting a tree are reported through
//! [`HierarchyError`]. Both expose stable machine-readable codes.

use std::{fmt, sync::Arc};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while assembling a merge tree from linkage events.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MergeTreeError {
    /// A merge distance did not yield a finite, strictly positive scale.
    #[error("merge {merge} at distance {distance} does not yield a finite positive scale")]
    DegenerateMerge {
        /// Identifier supplied for the offending merge.
        merge: usize,
        /// Distance supplied for the offending merge.
        distance: f64,
    },
    /// The handle was never issued by this builder.
    #[error("node handle {handle} was not issued by this builder")]
    UnknownHandle {
        /// The unrecognised handle.
        handle: usize,
    },
    /// The handle's subtree was already moved into an earlier merge.
    #[error("node handle {handle} has already been merged into a parent")]
    AlreadyMerged {
        /// The consumed handle.
        handle: usize,
    },
    /// Both sides of a merge referred to the same node.
    #[error("node handle {handle} cannot be merged with itself")]
    SelfMerge {
        /// The handle supplied twice.
        handle: usize,
    },
    /// A point identifier was registered more than once.
    #[error("point {point} was registered more than once")]
    DuplicatePoint {
        /// The repeated point identifier.
        point: usize,
    },
    /// A scripted merge referred to a node that does not exist yet.
    #[error("merge {merge} references unknown node {reference}")]
    InvalidReference {
        /// Position of the offending merge in the script.
        merge: usize,
        /// The unresolvable node reference.
        reference: usize,
    },
    /// The builder holds no nodes.
    #[error("cannot finish a merge tree without any points")]
    EmptyTree,
    /// More than one unmerged subtree remained when finishing.
    #[error("merge tree has {count} disconnected roots; expected exactly one")]
    MultipleRoots {
        /// Number of live roots left in the builder.
        count: usize,
    },
    /// A point identifier falls outside `0..point_count`.
    #[error("point {point} is outside the expected range 0..{point_count}")]
    PointOutOfRange {
        /// The offending point identifier.
        point: usize,
        /// Number of points covered by the finished tree.
        point_count: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`MergeTreeError`] variants.
    enum MergeTreeErrorCode for MergeTreeError {
        /// A merge distance did not yield a finite, strictly positive scale.
        DegenerateMerge => DegenerateMerge { .. } => "MERGE_TREE_DEGENERATE_MERGE",
        /// The handle was never issued by this builder.
        UnknownHandle => UnknownHandle { .. } => "MERGE_TREE_UNKNOWN_HANDLE",
        /// The handle's subtree was already moved into an earlier merge.
        AlreadyMerged => AlreadyMerged { .. } => "MERGE_TREE_ALREADY_MERGED",
        /// Both sides of a merge referred to the same node.
        SelfMerge => SelfMerge { .. } => "MERGE_TREE_SELF_MERGE",
        /// A point identifier was registered more than once.
        DuplicatePoint => DuplicatePoint { .. } => "MERGE_TREE_DUPLICATE_POINT",
        /// A scripted merge referred to a node that does not exist yet.
        InvalidReference => InvalidReference { .. } => "MERGE_TREE_INVALID_REFERENCE",
        /// The builder holds no nodes.
        EmptyTree => EmptyTree => "MERGE_TREE_EMPTY",
        /// More than one unmerged subtree remained when finishing.
        MultipleRoots => MultipleRoots { .. } => "MERGE_TREE_MULTIPLE_ROOTS",
        /// A point identifier falls outside the finished tree's range.
        PointOutOfRange => PointOutOfRange { .. } => "MERGE_TREE_POINT_OUT_OF_RANGE",
    }
}

/// Pass of the extraction pipeline during which an invariant failed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Stage {
    /// Bottom-up removal of sub-threshold branches.
    Condense,
    /// Excess-of-mass scoring and cluster selection.
    Select,
    /// Per-point assignment and hierarchy export.
    Export,
}

impl Stage {
    /// Returns the lowercase stage name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Condense => "condense",
            Self::Select => "select",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type produced when configuring or running hierarchy extraction.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HierarchyError {
    /// Minimum cluster size must be greater than zero.
    #[error("min_cluster_size must be at least 1 (got {got})")]
    InvalidMinClusterSize {
        /// The invalid minimum cluster size supplied by the caller.
        got: usize,
    },
    /// The tree holds fewer points than the configured minimum cluster size.
    #[error("min_cluster_size {min_cluster_size} exceeds point_count {point_count}")]
    MinClusterSizeTooLarge {
        /// Number of points covered by the tree.
        point_count: usize,
        /// Minimum cluster size requested by the caller.
        min_cluster_size: usize,
    },
    /// A structural invariant did not hold; the input tree is malformed.
    #[error("invariant violated during {stage} at node {node}: {invariant}")]
    InvariantViolation {
        /// Identifier of the node where the violation was detected.
        node: usize,
        /// Pass that detected the violation.
        stage: Stage,
        /// Description of the violated invariant.
        invariant: &'static str,
    },
    /// The dedicated worker pool could not be created.
    #[error("failed to build the worker pool: {message}")]
    ThreadPool {
        /// Message reported by the pool builder.
        message: Arc<str>,
    },
}

define_error_codes! {
    /// Stable codes describing [`HierarchyError`] variants.
    enum HierarchyErrorCode for HierarchyError {
        /// Minimum cluster size must be greater than zero.
        InvalidMinClusterSize => InvalidMinClusterSize { .. } => "HIERARCHY_INVALID_MIN_CLUSTER_SIZE",
        /// The tree holds fewer points than the configured minimum cluster size.
        MinClusterSizeTooLarge => MinClusterSizeTooLarge { .. } => "HIERARCHY_MIN_CLUSTER_SIZE_TOO_LARGE",
        /// A structural invariant did not hold.
        InvariantViolation => InvariantViolation { .. } => "HIERARCHY_INVARIANT_VIOLATION",
        /// The dedicated worker pool could not be created.
        ThreadPool => ThreadPool { .. } => "HIERARCHY_THREAD_POOL",
    }
}

impl HierarchyError {
    pub(crate) const fn invariant(node: usize, stage: Stage, invariant: &'static str) -> Self {
        Self::InvariantViolation {
            node,
            stage,
            invariant,
        }
    }
}

/// Convenient alias for results returned by the hierarchy passes.
pub type Result<T> = core::result::Result<T, HierarchyError>;
