mod image_record;
mod store;

pub use {
    image_record::ImageRecord,
    store::{HistoryStore, MAX_HISTORY_SIZE},
};
