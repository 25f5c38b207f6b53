//! In-memory device simulator implementing the transport trait.

// Each test binary uses a different subset of the simulator.
#![allow(dead_code)]

use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use aerlink_client::{Transport, TransportError, paths};
use aerlink_crypto::{ClientKey, envelope};
use async_trait::async_trait;

struct DeviceSim {
    /// Key the next sync handshake hands out.
    next_key: u32,
    /// Device-side view of the session key; status frames are encrypted
    /// under it.
    session_key: ClientKey,
    power: String,
    mode: String,
    pm2_5: u32,
    corrupt_status: bool,
    fail_status: bool,
    fail_control: bool,
    /// Raw envelopes received on the control endpoint.
    control_log: Vec<String>,
}

/// A simulated device behind the request/response transport.
pub struct MockTransport {
    sim: Mutex<DeviceSim>,
    sync_calls: AtomicUsize,
    in_flight_controls: AtomicUsize,
    max_in_flight_controls: AtomicUsize,
    control_delay: Duration,
}

impl MockTransport {
    pub fn new(first_key: u32) -> Self {
        Self {
            sim: Mutex::new(DeviceSim {
                next_key: first_key,
                session_key: ClientKey::from(first_key),
                power: "OFF".to_owned(),
                mode: "Auto General".to_owned(),
                pm2_5: 8,
                corrupt_status: false,
                fail_status: false,
                fail_control: false,
                control_log: Vec::new(),
            }),
            sync_calls: AtomicUsize::new(0),
            in_flight_controls: AtomicUsize::new(0),
            max_in_flight_controls: AtomicUsize::new(0),
            control_delay: Duration::ZERO,
        }
    }

    pub fn with_control_delay(mut self, delay: Duration) -> Self {
        self.control_delay = delay;
        self
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight_controls(&self) -> usize {
        self.max_in_flight_controls.load(Ordering::SeqCst)
    }

    pub fn control_log(&self) -> Vec<String> {
        self.sim.lock().unwrap().control_log.clone()
    }

    pub fn set_pm2_5(&self, pm2_5: u32) {
        self.sim.lock().unwrap().pm2_5 = pm2_5;
    }

    pub fn set_corrupt_status(&self, corrupt: bool) {
        self.sim.lock().unwrap().corrupt_status = corrupt;
    }

    pub fn set_fail_status(&self, fail: bool) {
        self.sim.lock().unwrap().fail_status = fail;
    }

    pub fn set_fail_control(&self, fail: bool) {
        self.sim.lock().unwrap().fail_control = fail;
    }

    fn status_frame(&self) -> Result<Vec<u8>, TransportError> {
        let sim = self.sim.lock().unwrap();
        if sim.fail_status {
            return Err(TransportError::new("status request failed"));
        }

        let body = format!(
            r#"{{"state":{{"reported":{{"D03-02":"{}","D03-12":"{}","D03-33":{}}}}}}}"#,
            sim.power, sim.mode, sim.pm2_5
        );
        let mut frame = envelope::encrypt(sim.session_key, body.as_bytes());

        if sim.corrupt_status {
            // Flip the last digest character.
            let last = frame.pop().unwrap();
            frame.push(if last == '0' { '1' } else { '0' });
        }

        Ok(frame.into_bytes())
    }

    fn handle_sync(&self) -> Vec<u8> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);

        let mut sim = self.sim.lock().unwrap();
        let key = ClientKey::from(sim.next_key);
        sim.session_key = key;
        sim.next_key = sim.next_key.wrapping_add(0x10);

        key.to_string().into_bytes()
    }

    async fn handle_control(&self, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let in_flight = self.in_flight_controls.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight_controls.fetch_max(in_flight, Ordering::SeqCst);

        if !self.control_delay.is_zero() {
            tokio::time::sleep(self.control_delay).await;
        }

        let result = self.apply_control(payload);
        self.in_flight_controls.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn apply_control(&self, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let mut sim = self.sim.lock().unwrap();
        if sim.fail_control {
            return Err(TransportError::new("control request failed"));
        }

        let frame =
            String::from_utf8(payload).map_err(|_| TransportError::new("non-text envelope"))?;
        let plaintext =
            envelope::decrypt(&frame).map_err(|err| TransportError::new(err.to_string()))?;
        let document: serde_json::Value = serde_json::from_slice(&plaintext)
            .map_err(|err| TransportError::new(err.to_string()))?;

        // The device follows the advanced counter embedded in the frame.
        sim.session_key = ClientKey::parse(&frame[..8]).unwrap();

        let desired = &document["state"]["desired"];
        if let Some(power) = desired["D03-02"].as_str() {
            sim.power = power.to_owned();
        }
        if let Some(mode) = desired["D03-12"].as_str() {
            sim.mode = mode.to_owned();
        }

        sim.control_log.push(frame);
        Ok(br#"{"status":"success"}"#.to_vec())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        match path {
            paths::STATUS => self.status_frame(),
            paths::INFO => Ok(br#"{"D01-03":"Living Room","D01-05":"AC3858"}"#.to_vec()),
            _ => Err(TransportError::new(format!("unexpected GET {path}"))),
        }
    }

    async fn post(&self, path: &str, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        match path {
            paths::SYNC => {
                assert_eq!(payload.len(), 8, "sync payload is 4 random bytes as hex");
                Ok(self.handle_sync())
            },
            paths::CONTROL => self.handle_control(payload).await,
            _ => Err(TransportError::new(format!("unexpected POST {path}"))),
        }
    }
}
