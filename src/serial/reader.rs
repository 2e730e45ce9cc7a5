//! # Serial Reader Loop
//!
//! Pulls bytes from the GPS source, frames and decodes sentences, commits
//! accepted fixes to the store and reports a silent source.
//!
//! One cycle is: bounded read, frame extraction, decode & commit, silence
//! check, fixed delay. Nothing in a cycle is fatal; the loop only ends when
//! the shutdown signal fires.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::port_trait::SerialSource;
use super::silence::SilenceMonitor;
use crate::config::SerialConfig;
use crate::nmea::{decode, DecodeError, SentenceFramer};
use crate::shutdown::Shutdown;
use crate::store::CoordinateStore;

/// Counters kept by the reader loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReaderStats {
    /// Complete sentences extracted from the byte stream
    pub sentences: u64,
    /// Fixes pushed into the store
    pub fixes: u64,
    /// Fix sentences rejected as malformed or out of range
    pub rejected: u64,
    /// "Source silent" diagnostics emitted
    pub silent_events: u64,
    /// Failed reads from the source
    pub read_errors: u64,
    /// Partial sentences dropped for overflowing the buffer
    pub dropped_frames: u64,
}

/// Ingestion loop from a serial source into the coordinate store
pub struct SerialReader<S> {
    source: S,
    store: Arc<CoordinateStore>,
    framer: SentenceFramer,
    monitor: SilenceMonitor,
    scratch: Vec<u8>,
    read_timeout: Duration,
    cycle_delay: Duration,
    stats: ReaderStats,
    failing: bool,
}

impl<S: SerialSource> SerialReader<S> {
    pub fn new(source: S, store: Arc<CoordinateStore>, config: &SerialConfig) -> Self {
        Self {
            source,
            store,
            framer: SentenceFramer::new(config.buffer_size),
            monitor: SilenceMonitor::new(config.silence_threshold(), Instant::now()),
            scratch: vec![0; config.buffer_size.max(1)],
            read_timeout: config.read_timeout(),
            cycle_delay: config.cycle_delay(),
            stats: ReaderStats::default(),
            failing: false,
        }
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Run cycles until shutdown, returning the final counters
    pub async fn run(mut self, mut shutdown: Shutdown) -> ReaderStats {
        info!(
            "Serial reader started (silence threshold {:?})",
            self.monitor.threshold()
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Serial reader stopping: {:?}", self.stats);
                    break;
                }
                _ = self.cycle() => {}
            }
        }

        self.stats
    }

    /// Execute one read/decode/commit cycle including the post-cycle delay
    pub async fn cycle(&mut self) {
        self.read_once().await;
        self.drain_sentences();
        self.check_silence();
        tokio::time::sleep(self.cycle_delay).await;
    }

    async fn read_once(&mut self) {
        // Never read more than the framer can hold
        let limit = self.framer.remaining().clamp(1, self.scratch.len());

        match self.source.read(&mut self.scratch[..limit], self.read_timeout).await {
            Ok(0) => {}
            Ok(n) => {
                if self.failing {
                    info!("Serial source readable again");
                    self.failing = false;
                }
                trace!("Read {} bytes from serial source", n);
                self.framer.extend(&self.scratch[..n]);
            }
            Err(e) => {
                self.stats.read_errors += 1;
                if self.failing {
                    debug!("Serial read failed again: {}", e);
                } else {
                    warn!("Serial read failed: {}", e);
                    self.failing = true;
                }
            }
        }
    }

    fn drain_sentences(&mut self) {
        while let Some(sentence) = self.framer.next_sentence() {
            self.stats.sentences += 1;

            match decode(&sentence) {
                Ok(coordinate) => {
                    self.store.push(coordinate);
                    self.monitor.record_fix(Instant::now());
                    self.stats.fixes += 1;
                    debug!("Stored fix {}", coordinate);
                }
                Err(DecodeError::UnrecognizedSentence(_)) => {
                    trace!("Ignoring sentence {:?}", sentence);
                }
                Err(e) => {
                    self.stats.rejected += 1;
                    debug!("Rejected sentence {:?}: {}", sentence, e);
                }
            }
        }

        self.stats.dropped_frames = self.framer.dropped();
    }

    fn check_silence(&mut self) {
        if !self.monitor.check(Instant::now()) {
            return;
        }

        self.stats.silent_events += 1;
        warn!("{}", self.silence_message());
    }

    fn silence_message(&self) -> String {
        let threshold = self.monitor.threshold();
        match self.monitor.last_fix() {
            Some(at) => format!(
                "No data received from GPS source for {:?} (last fix at {})",
                threshold,
                at.to_rfc3339()
            ),
            None => format!(
                "No data received from GPS source for {:?} (no fix since startup)",
                threshold
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::port_trait::mocks::MockSerialSource;
    use crate::shutdown;
    use std::io;

    const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const GSV: &[u8] = b"$GPGSV,3,1,11,03,03,111,00,04,15,270,00,06,01,010,00,13,06,292,00*74\r\n";

    fn test_config() -> SerialConfig {
        SerialConfig {
            read_timeout_ms: 100,
            cycle_delay_ms: 100,
            silence_threshold_ms: 10_000,
            buffer_size: 256,
            ..SerialConfig::default()
        }
    }

    fn reader(mock: &MockSerialSource) -> (SerialReader<MockSerialSource>, Arc<CoordinateStore>) {
        let store = Arc::new(CoordinateStore::new(10));
        let reader = SerialReader::new(mock.clone(), Arc::clone(&store), &test_config());
        (reader, store)
    }

    async fn run_until(reader: &mut SerialReader<MockSerialSource>, deadline: Instant) {
        while Instant::now() < deadline {
            reader.cycle().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_stores_decoded_fix() {
        let mock = MockSerialSource::new();
        mock.push_data(GGA);
        let (mut reader, store) = reader(&mock);

        reader.cycle().await;

        let fixes = store.snapshot();
        assert_eq!(fixes.len(), 1);
        assert!((fixes[0].latitude() - 48.1173).abs() < 1e-4);
        assert!((fixes[0].longitude() - 11.5167).abs() < 1e-4);
        assert_eq!(reader.stats().fixes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrelated_sentence_not_stored() {
        let mock = MockSerialSource::new();
        mock.push_data(GSV);
        let (mut reader, store) = reader(&mock);

        reader.cycle().await;

        assert!(store.is_empty());
        let stats = reader.stats();
        assert_eq!(stats.sentences, 1);
        assert_eq!(stats.fixes, 0);
        assert_eq!(stats.rejected, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sentence_split_across_reads() {
        let mock = MockSerialSource::new();
        mock.push_data(&GGA[..20]);
        mock.push_data(&GGA[20..]);
        let (mut reader, store) = reader(&mock);

        reader.cycle().await;
        assert!(store.is_empty());

        reader.cycle().await;
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_stream_in_order() {
        let mock = MockSerialSource::new();
        let mut stream = Vec::new();
        stream.extend_from_slice(GSV);
        stream.extend_from_slice(b"$GPGGA,000001,3351.600,S,15112.600,W,1,05,1.0,10.0,M,,M,,\r\n");
        stream.extend_from_slice(b"$GPGGA,000002,48O7.038,N,01131.000,E\r\n");
        stream.extend_from_slice(GGA);
        mock.push_data(&stream);
        let (mut reader, store) = reader(&mock);

        reader.cycle().await;

        let fixes = store.snapshot();
        assert_eq!(fixes.len(), 2);
        assert!(fixes[0].latitude() < 0.0 && fixes[0].longitude() < 0.0);
        assert!(fixes[1].latitude() > 0.0 && fixes[1].longitude() > 0.0);

        let stats = reader.stats();
        assert_eq!(stats.sentences, 4);
        assert_eq!(stats.fixes, 2);
        assert_eq!(stats.rejected, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_errors_are_not_fatal() {
        let mock = MockSerialSource::new();
        mock.push_error(io::ErrorKind::BrokenPipe);
        mock.push_error(io::ErrorKind::BrokenPipe);
        mock.push_data(GGA);
        let (mut reader, store) = reader(&mock);

        for _ in 0..3 {
            reader.cycle().await;
        }

        assert_eq!(reader.stats().read_errors, 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_reported_once_per_window() {
        let mock = MockSerialSource::new();
        let start = Instant::now();
        let (mut reader, _store) = reader(&mock);

        run_until(&mut reader, start + Duration::from_secs(15)).await;
        assert_eq!(reader.stats().silent_events, 1);

        // A fix restarts the window
        mock.push_data(GGA);
        reader.cycle().await;
        assert_eq!(reader.stats().fixes, 1);

        run_until(&mut reader, start + Duration::from_secs(24)).await;
        assert_eq!(reader.stats().silent_events, 1);

        run_until(&mut reader, start + Duration::from_secs(30)).await;
        assert_eq!(reader.stats().silent_events, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_warning_names_last_fix_time() {
        let mock = MockSerialSource::new();
        let start = Instant::now();
        let (mut reader, _store) = reader(&mock);

        run_until(&mut reader, start + Duration::from_secs(12)).await;
        assert_eq!(reader.stats().silent_events, 1);
        assert!(reader.monitor.last_fix().is_none());
        assert!(reader.silence_message().ends_with("(no fix since startup)"));

        let before = chrono::Utc::now();
        mock.push_data(GGA);
        reader.cycle().await;
        let after = chrono::Utc::now();

        run_until(&mut reader, start + Duration::from_secs(24)).await;
        assert_eq!(reader.stats().silent_events, 2);

        let last_fix = reader.monitor.last_fix().unwrap();
        assert!(last_fix >= before && last_fix <= after);
        let message = reader.silence_message();
        assert!(message.contains(&last_fix.to_rfc3339()), "{}", message);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_silence_while_fixes_arrive() {
        let mock = MockSerialSource::new();
        for _ in 0..100 {
            mock.push_data(GGA);
        }
        let (mut reader, store) = reader(&mock);

        for _ in 0..100 {
            reader.cycle().await;
        }

        assert_eq!(reader.stats().silent_events, 0);
        assert_eq!(store.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_garbage_frame_dropped() {
        let mock = MockSerialSource::new();
        let mut junk = b"$GPGGA,".to_vec();
        junk.extend(std::iter::repeat(b'9').take(400));
        mock.push_data(&junk);
        mock.push_data(GGA);
        let (mut reader, store) = reader(&mock);

        reader.cycle().await;
        reader.cycle().await;

        assert_eq!(reader.stats().dropped_frames, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let mock = MockSerialSource::new();
        mock.push_data(GGA);
        let (reader, store) = reader(&mock);
        let (trigger, shutdown) = shutdown::channel();

        let handle = tokio::spawn(reader.run(shutdown));
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.fire();

        let stats = handle.await.unwrap();
        assert_eq!(stats.fixes, 1);
        assert_eq!(store.len(), 1);
        assert!(mock.read_count() >= 2);
    }
}
