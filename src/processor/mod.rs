pub mod device_locks;
pub mod message_processor;
pub mod query_service;
pub mod trip_segmenter;
