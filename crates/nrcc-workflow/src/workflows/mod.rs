pub mod reclassification;
