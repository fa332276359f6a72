use bitflags::bitflags;
use strata_types::ValueType;

bitflags! {
    /// Usage bits attached to each listed property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyUsage: u32 {
        /// Persisted when settings are saved.
        const STORAGE = 1 << 1;
        /// Shown in editors.
        const EDITOR = 1 << 2;
        const INTERNAL = 1 << 3;
        /// Shown in the basic (non-advanced) view.
        const BASIC = 1 << 4;
        const RESTART_IF_CHANGED = 1 << 5;
    }
}

/// One row of an ordered property listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyInfo {
    pub name: String,
    pub value_type: ValueType,
    pub order: u64,
    pub usage: PropertyUsage,
}
