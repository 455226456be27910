pub mod attachment_manager;
pub mod export_manager;
pub mod message_list;
