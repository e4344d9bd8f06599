mod contract;
mod debounce_strategy;
mod mirror_properties;
mod phase_ordering;
mod scenarios;
