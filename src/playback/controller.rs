//! Playback controller: one output device, at most one sound at a time.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::device::{AudioContext, AudioPlatform, SoundSource};
use crate::audio::resample;
use crate::audio::sample::{check_shape, fill_pcm_buffer, pcm_frame_count};
use crate::error::{AudioError, Result};

type SourceOf<P> = <<P as AudioPlatform>::Context as AudioContext>::Source;

/// Owns the output device and the currently playing source.
///
/// The device is opened on the first [`play`](Self::play) and reused after
/// that. Every new sound replaces the previous one; the previous source is
/// always stopped before the new one starts.
pub struct PlaybackController<P: AudioPlatform> {
    platform: P,
    context: Option<P::Context>,
    active: Option<SourceOf<P>>,
}

impl<P: AudioPlatform> PlaybackController<P> {
    /// Creates a controller that opens devices through `platform`.
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            context: None,
            active: None,
        }
    }

    /// Returns the platform used to open devices.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Returns true once the output device has been opened.
    pub fn has_device(&self) -> bool {
        self.context.is_some()
    }

    /// Returns the recorded source, finished or not.
    pub fn active_source(&self) -> Option<&SourceOf<P>> {
        self.active.as_ref()
    }

    /// Returns true while the recorded source still has frames to play.
    pub fn is_playing(&self) -> bool {
        self.active.as_ref().is_some_and(|source| !source.is_finished())
    }

    /// Waits for the active sound to finish, checking every `poll`.
    ///
    /// Returns false if `limit` elapsed while the sound still reported
    /// frames left, which happens when the device stops pulling data.
    pub async fn wait_until_finished(&self, poll: Duration, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while self.is_playing() {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(poll).await;
        }
        true
    }

    /// Returns the open device, creating it on first use and resuming it
    /// if it was suspended.
    fn context(&mut self) -> Result<&mut P::Context> {
        let context = match self.context.take() {
            Some(context) => context,
            None => {
                info!("Opening audio output device");
                self.platform.create_context()?
            }
        };
        let context = self.context.insert(context);

        if context.is_suspended() {
            if let Err(e) = context.resume() {
                warn!(error = %e, "Failed to resume audio output device");
            }
        }

        Ok(context)
    }

    /// Stops and releases the active source, if any.
    ///
    /// Stopping a source that already finished is not an error.
    pub fn stop_active(&mut self) {
        if let Some(mut source) = self.active.take() {
            if let Err(e) = source.stop() {
                debug!(error = %e, "Ignoring stop on finished source");
            }
            source.disconnect();
            debug!("Stopped active source");
        }
    }

    /// Plays interleaved little-endian PCM16 bytes.
    ///
    /// Empty input is ignored; input shorter than one frame is rejected.
    /// Decoding and conversion to the device rate run on tokio's blocking
    /// pool. If the device, decode or source creation fails, the previous
    /// sound keeps playing.
    pub async fn play(&mut self, pcm_bytes: Vec<u8>, sample_rate: u32, channel_count: u16) -> Result<()> {
        if pcm_bytes.is_empty() {
            debug!("Ignoring empty playback request");
            return Ok(());
        }
        check_shape(sample_rate, channel_count as usize)?;

        let frame_count = pcm_frame_count(pcm_bytes.len(), channel_count);
        if frame_count == 0 {
            return Err(AudioError::invalid_audio_format(format!(
                "{} bytes is less than one frame of {} channel(s)",
                pcm_bytes.len(),
                channel_count
            )));
        }

        let context = self.context()?;
        let mut buffer = context.create_buffer(channel_count, frame_count, sample_rate);
        let output_rate = context.output_rate();

        let buffer = tokio::task::spawn_blocking(move || {
            fill_pcm_buffer(&mut buffer, &pcm_bytes);
            match output_rate {
                Some(rate) if rate != buffer.sample_rate() => resample(&buffer, rate),
                _ => Ok(buffer),
            }
        })
        .await
        .map_err(|e| AudioError::playback_failed(format!("Decode task failed: {}", e)))??;

        let mut source = context.create_source(buffer)?;

        self.stop_active();
        source.start()?;
        self.active = Some(source);

        debug!(frame_count, sample_rate, channel_count, "Started playback");
        Ok(())
    }
}

impl<P: AudioPlatform> Drop for PlaybackController<P> {
    fn drop(&mut self) {
        self.stop_active();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::audio::{pcm16_to_bytes, PcmBuffer};
    use crate::error::ErrorCode;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Event {
        CreateContext,
        Resume,
        CreateSource { id: usize, frames: usize, channels: usize },
        Start(usize),
        Stop(usize),
        Disconnect(usize),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    #[derive(Default)]
    pub struct MockPlatform {
        pub log: Log,
        pub fail_context: bool,
        pub start_suspended: bool,
        pub output_rate: Option<u32>,
    }

    pub struct MockContext {
        log: Log,
        suspended: bool,
        output_rate: Option<u32>,
        next_id: usize,
    }

    pub struct MockSource {
        pub id: usize,
        pub buffer: PcmBuffer,
        log: Log,
        started: bool,
        stopped: bool,
        pub finished: bool,
    }

    impl AudioPlatform for MockPlatform {
        type Context = MockContext;

        fn create_context(&self) -> Result<MockContext> {
            if self.fail_context {
                return Err(AudioError::device_unavailable("no device in test"));
            }
            self.log.borrow_mut().push(Event::CreateContext);
            Ok(MockContext {
                log: self.log.clone(),
                suspended: self.start_suspended,
                output_rate: self.output_rate,
                next_id: 1,
            })
        }
    }

    impl AudioContext for MockContext {
        type Source = MockSource;

        fn is_suspended(&self) -> bool {
            self.suspended
        }

        fn resume(&mut self) -> Result<()> {
            self.suspended = false;
            self.log.borrow_mut().push(Event::Resume);
            Ok(())
        }

        fn output_rate(&self) -> Option<u32> {
            self.output_rate
        }

        fn create_source(&mut self, buffer: PcmBuffer) -> Result<MockSource> {
            let id = self.next_id;
            self.next_id += 1;
            self.log.borrow_mut().push(Event::CreateSource {
                id,
                frames: buffer.frame_count(),
                channels: buffer.channel_count(),
            });
            Ok(MockSource {
                id,
                buffer,
                log: self.log.clone(),
                started: false,
                stopped: false,
                finished: false,
            })
        }
    }

    impl SoundSource for MockSource {
        fn start(&mut self) -> Result<()> {
            self.started = true;
            self.log.borrow_mut().push(Event::Start(self.id));
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.log.borrow_mut().push(Event::Stop(self.id));
            if !self.started || self.stopped || self.finished {
                return Err(AudioError::playback_failed("source is not playing"));
            }
            self.stopped = true;
            Ok(())
        }

        fn is_finished(&self) -> bool {
            self.finished
        }

        fn disconnect(&mut self) {
            self.log.borrow_mut().push(Event::Disconnect(self.id));
        }
    }

    fn tone() -> Vec<u8> {
        pcm16_to_bytes(&[0, 8192, 16384, -16384])
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let platform = MockPlatform::default();
        let log = platform.log.clone();
        let mut controller = PlaybackController::new(platform);

        controller.play(Vec::new(), 24000, 1).await.unwrap();

        assert!(controller.active_source().is_none());
        assert!(!controller.has_device());
        assert!(log.borrow().is_empty());
    }

    #[tokio::test]
    async fn empty_input_keeps_current_source() {
        let mut controller = PlaybackController::new(MockPlatform::default());
        controller.play(tone(), 24000, 1).await.unwrap();

        controller.play(Vec::new(), 24000, 1).await.unwrap();

        assert_eq!(controller.active_source().unwrap().id, 1);
        assert!(controller.is_playing());
    }

    #[tokio::test]
    async fn play_decodes_and_starts() {
        let platform = MockPlatform::default();
        let log = platform.log.clone();
        let mut controller = PlaybackController::new(platform);

        controller.play(tone(), 24000, 2).await.unwrap();

        let source = controller.active_source().unwrap();
        assert_eq!(source.buffer.sample_rate(), 24000);
        assert_eq!(source.buffer.channel(0).unwrap(), &[0.0, 0.5]);
        assert_eq!(source.buffer.channel(1).unwrap(), &[0.25, -0.5]);
        assert_eq!(
            *log.borrow(),
            vec![
                Event::CreateContext,
                Event::CreateSource { id: 1, frames: 2, channels: 2 },
                Event::Start(1),
            ]
        );
    }

    #[tokio::test]
    async fn second_play_stops_first_before_starting() {
        let platform = MockPlatform::default();
        let log = platform.log.clone();
        let mut controller = PlaybackController::new(platform);

        controller.play(tone(), 24000, 1).await.unwrap();
        controller.play(tone(), 24000, 1).await.unwrap();

        assert_eq!(controller.active_source().unwrap().id, 2);
        assert_eq!(
            *log.borrow(),
            vec![
                Event::CreateContext,
                Event::CreateSource { id: 1, frames: 4, channels: 1 },
                Event::Start(1),
                Event::CreateSource { id: 2, frames: 4, channels: 1 },
                Event::Stop(1),
                Event::Disconnect(1),
                Event::Start(2),
            ]
        );
    }

    #[tokio::test]
    async fn device_is_created_once() {
        let platform = MockPlatform::default();
        let log = platform.log.clone();
        let mut controller = PlaybackController::new(platform);

        for _ in 0..3 {
            controller.play(tone(), 16000, 1).await.unwrap();
        }

        let contexts = log
            .borrow()
            .iter()
            .filter(|e| **e == Event::CreateContext)
            .count();
        assert_eq!(contexts, 1);
        assert!(controller.has_device());
    }

    #[tokio::test]
    async fn suspended_device_is_resumed() {
        let platform = MockPlatform {
            start_suspended: true,
            ..Default::default()
        };
        let log = platform.log.clone();
        let mut controller = PlaybackController::new(platform);

        controller.play(tone(), 24000, 1).await.unwrap();

        assert_eq!(log.borrow()[1], Event::Resume);
    }

    #[tokio::test]
    async fn stop_active_is_idempotent() {
        let platform = MockPlatform::default();
        let log = platform.log.clone();
        let mut controller = PlaybackController::new(platform);
        controller.play(tone(), 24000, 1).await.unwrap();

        controller.stop_active();
        controller.stop_active();

        assert!(controller.active_source().is_none());
        assert!(!controller.is_playing());
        let stops = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Stop(_)))
            .count();
        assert_eq!(stops, 1);
    }

    #[tokio::test]
    async fn stopping_finished_source_is_swallowed() {
        let platform = MockPlatform::default();
        let log = platform.log.clone();
        let mut controller = PlaybackController::new(platform);
        controller.play(tone(), 24000, 1).await.unwrap();
        controller.active.as_mut().unwrap().finished = true;
        assert!(!controller.is_playing());

        controller.play(tone(), 24000, 1).await.unwrap();

        assert_eq!(controller.active_source().unwrap().id, 2);
        assert!(log.borrow().contains(&Event::Disconnect(1)));
    }

    #[tokio::test]
    async fn device_failure_keeps_state() {
        let platform = MockPlatform {
            fail_context: true,
            ..Default::default()
        };
        let mut controller = PlaybackController::new(platform);

        let err = controller.play(tone(), 24000, 1).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DeviceUnavailable);
        assert!(!controller.has_device());
        assert!(controller.active_source().is_none());
    }

    #[tokio::test]
    async fn invalid_shape_keeps_current_source() {
        let platform = MockPlatform::default();
        let log = platform.log.clone();
        let mut controller = PlaybackController::new(platform);
        controller.play(tone(), 24000, 1).await.unwrap();

        let err = controller.play(tone(), 24000, 0).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidAudioFormat);
        assert_eq!(controller.active_source().unwrap().id, 1);
        assert!(!log.borrow().iter().any(|e| matches!(e, Event::Stop(_))));
    }

    #[tokio::test]
    async fn partial_frame_keeps_current_source() {
        let platform = MockPlatform::default();
        let log = platform.log.clone();
        let mut controller = PlaybackController::new(platform);
        controller.play(tone(), 24000, 1).await.unwrap();

        let err = controller.play(vec![7], 24000, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAudioFormat);
        let err = controller.play(vec![1, 2], 24000, 2).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAudioFormat);

        assert_eq!(controller.active_source().unwrap().id, 1);
        assert!(controller.is_playing());
        let events = log.borrow();
        assert!(!events.iter().any(|e| matches!(e, Event::Stop(_))));
        assert!(!events.iter().any(|e| matches!(e, Event::CreateSource { id: 2, .. })));
    }

    #[tokio::test]
    async fn buffer_is_converted_to_output_rate() {
        let platform = MockPlatform {
            output_rate: Some(48000),
            ..Default::default()
        };
        let mut controller = PlaybackController::new(platform);
        let pcm = pcm16_to_bytes(&[8192i16; 2400]);

        controller.play(pcm, 24000, 1).await.unwrap();

        let source = controller.active_source().unwrap();
        assert_eq!(source.buffer.sample_rate(), 48000);
        assert_eq!(source.buffer.frame_count(), 4800);
    }

    #[tokio::test]
    async fn matching_output_rate_is_not_converted() {
        let platform = MockPlatform {
            output_rate: Some(24000),
            ..Default::default()
        };
        let mut controller = PlaybackController::new(platform);

        controller.play(tone(), 24000, 2).await.unwrap();

        let source = controller.active_source().unwrap();
        assert_eq!(source.buffer.channel(0).unwrap(), &[0.0, 0.5]);
    }

    #[tokio::test]
    async fn wait_gives_up_on_stalled_source() {
        let mut controller = PlaybackController::new(MockPlatform::default());
        controller.play(tone(), 24000, 1).await.unwrap();

        let finished = controller
            .wait_until_finished(Duration::from_millis(5), Duration::from_millis(30))
            .await;

        assert!(!finished);
        assert!(controller.is_playing());
    }

    #[tokio::test]
    async fn wait_returns_once_source_finishes() {
        let mut controller = PlaybackController::new(MockPlatform::default());
        assert!(
            controller
                .wait_until_finished(Duration::from_millis(5), Duration::ZERO)
                .await
        );

        controller.play(tone(), 24000, 1).await.unwrap();
        controller.active.as_mut().unwrap().finished = true;
        assert!(
            controller
                .wait_until_finished(Duration::from_millis(5), Duration::from_secs(5))
                .await
        );
    }

    #[tokio::test]
    async fn drop_stops_active_source() {
        let platform = MockPlatform::default();
        let log = platform.log.clone();
        let mut controller = PlaybackController::new(platform);
        controller.play(tone(), 24000, 1).await.unwrap();

        drop(controller);

        assert_eq!(log.borrow().last(), Some(&Event::Disconnect(1)));
    }
}
