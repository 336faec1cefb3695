//! Shutdown signal the test triggers explicitly.

use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::shutdown::{ShutdownError, ShutdownSignal};

/// Signal released by sending on the paired channel.
pub struct ChannelShutdownSignal {
    receiver: Mutex<Receiver<()>>,
}

impl ChannelShutdownSignal {
    /// Returns the signal and the trigger that releases it.
    pub fn new() -> (Self, Sender<()>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                receiver: Mutex::new(receiver),
            },
            sender,
        )
    }
}

impl ShutdownSignal for ChannelShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let receiver = self.receiver.lock().expect("shutdown receiver poisoned");
        // A dropped trigger also releases the wait.
        let _ = receiver.recv();
        Ok(())
    }
}
