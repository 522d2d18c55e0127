pub(crate) mod context;
pub(crate) mod dirty;
pub(crate) mod spanners;
