use tokio::sync::mpsc::Sender;
use tracing::info;

use super::{error::Error, types::RateStreamer};
use common::types::RateRecord;

pub struct Producer<S: RateStreamer> {
    streamer: S,
}

impl<S> Producer<S>
where
    S: RateStreamer,
{
    pub fn new(streamer: S) -> Self {
        Producer { streamer }
    }

    pub fn spawn(self, sender: Sender<Vec<RateRecord>>) -> tokio::task::JoinHandle<Result<usize, Error>> {
        info!("Producer ready.");
        tokio::spawn(async move { self.streamer.run_stream(sender).await })
    }
}
