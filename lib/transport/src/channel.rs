use anyhow::{Context, anyhow};
use futures_util::FutureExt;
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tokio_util::sync::CancellationToken;

const CHANNEL_BUFFER_MAX_LEN: usize = 1_024;

/// A channel whose receiver buffers the in-flight message so it
/// can be re-transmitted after a reconnect. The outbound half of
/// every stream is written by exactly one task draining one of
/// these; everything else enqueues through the [Sender].
#[derive(Debug)]
pub struct BufferedChannel<T> {
  pub sender: Sender<T>,
  pub receiver: Mutex<BufferedReceiver<T>>,
}

impl<T: Send + Clone> Default for BufferedChannel<T> {
  fn default() -> Self {
    let (sender, receiver) = buffered_channel();
    BufferedChannel {
      sender,
      receiver: receiver.into(),
    }
  }
}

impl<T> BufferedChannel<T> {
  pub fn receiver(
    &self,
  ) -> anyhow::Result<MutexGuard<'_, BufferedReceiver<T>>> {
    self
      .receiver
      .try_lock()
      .context("Receiver is already locked")
  }
}

/// Create a channel
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
  let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_MAX_LEN);
  (
    Sender(sender),
    Receiver {
      receiver,
      cancel: None,
    },
  )
}

/// Create a buffered channel
pub fn buffered_channel<T: Send + Clone>()
-> (Sender<T>, BufferedReceiver<T>) {
  let (sender, receiver) = channel();
  (sender, BufferedReceiver::new(receiver))
}

#[derive(Debug)]
pub struct Sender<T>(mpsc::Sender<T>);

impl<T> Clone for Sender<T> {
  fn clone(&self) -> Self {
    Self(self.0.clone())
  }
}

impl<T> Sender<T> {
  pub async fn send(&self, data: T) -> anyhow::Result<()> {
    self.0.send(data).await.map_err(|e| anyhow!("{e:?}"))
  }
}

#[derive(Debug)]
pub struct Receiver<T> {
  receiver: mpsc::Receiver<T>,
  cancel: Option<CancellationToken>,
}

impl<T: Send> Receiver<T> {
  pub fn set_cancel(&mut self, cancel: CancellationToken) {
    self.cancel = Some(cancel);
  }

  pub async fn recv(&mut self) -> anyhow::Result<T> {
    let recv = self
      .receiver
      .recv()
      .map(|res| res.context("Channel is permanently closed"));
    if let Some(cancel) = &self.cancel {
      tokio::select! {
        message = recv => message,
        _ = cancel.cancelled() => Err(anyhow!("Stream cancelled"))
      }
    } else {
      recv.await
    }
  }
}

/// Control when the latest message is dropped, in case it must be re-transmitted.
#[derive(Debug)]
pub struct BufferedReceiver<T> {
  receiver: Receiver<T>,
  buffer: Option<T>,
}

impl<T: Send + Clone> BufferedReceiver<T> {
  pub fn new(receiver: Receiver<T>) -> BufferedReceiver<T> {
    BufferedReceiver {
      receiver,
      buffer: None,
    }
  }

  pub fn set_cancel(&mut self, cancel: CancellationToken) {
    self.receiver.set_cancel(cancel);
  }

  /// - If 'buffer: Some(message)':
  ///   - Immediately returns clone of buffer.
  /// - Else:
  ///   - Wait for next item.
  ///   - store in buffer.
  ///   - return clone of buffer.
  pub async fn recv(&mut self) -> anyhow::Result<T> {
    if let Some(buffer) = self.buffer.clone() {
      Ok(buffer)
    } else {
      let message = self.receiver.recv().await?;
      self.buffer = Some(message.clone());
      Ok(message)
    }
  }

  /// Clears buffer.
  /// Should be called after transmission confirmed.
  pub fn clear_buffer(&mut self) {
    self.buffer = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn buffered_receiver_replays_until_cleared() {
    let (sender, mut receiver) = buffered_channel::<u8>();
    sender.send(7).await.unwrap();
    sender.send(8).await.unwrap();
    // Unconfirmed message is replayed.
    assert_eq!(receiver.recv().await.unwrap(), 7);
    assert_eq!(receiver.recv().await.unwrap(), 7);
    receiver.clear_buffer();
    assert_eq!(receiver.recv().await.unwrap(), 8);
  }

  #[tokio::test]
  async fn cancelled_receiver_errors() {
    let (_sender, mut receiver) = channel::<u8>();
    let cancel = CancellationToken::new();
    receiver.set_cancel(cancel.clone());
    cancel.cancel();
    assert!(receiver.recv().await.is_err());
  }
}
