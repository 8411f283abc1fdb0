pub mod checkpoint_record;
pub mod checkpoint_store;
