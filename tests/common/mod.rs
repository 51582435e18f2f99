//! In-process board double.
//!
//! Speaks the real wire protocol over a [`Remote`], backed by a 32-slot
//! breakpoint table, byte-addressed memory, and scripted status and
//! terminal queues. Runs on its own thread until the host's link drops,
//! then hands its final state back for inspection.

use std::collections::{HashMap, VecDeque};
use std::thread::{self, JoinHandle};

use jetty::link::Remote;

/// Bytes in one breakpoint slot record (misc + addresses + data).
const RECORD: usize = 26;

/// Scripted board double.
pub struct Emulator {
    /// Far side of the host's link.
    remote: Remote,
    /// Request bytes not yet consumed.
    buf: VecDeque<u8>,
    /// Scripted status bytes, one per probe (empty repeats the last).
    pub status: VecDeque<u8>,
    /// Most recently replayed status byte.
    latest: u8,
    /// When set, probe replies are truncated after the status byte.
    pub truncate_probe: bool,
    /// Register file, as read back by the host.
    pub regs: [u32; 16],
    /// Byte-addressed memory image.
    pub memory: HashMap<u32, u8>,
    /// Scripted terminal output chunks.
    pub output: VecDeque<Vec<u8>>,
    /// Terminal input received from the host.
    pub input: Vec<u8>,
    /// Breakpoint bitmaps.
    pub active: u32,
    pub defined: u32,
    /// Raw slot records.
    pub slots: [[u8; RECORD]; 32],
    /// Opcodes executed, in order.
    pub log: Vec<u8>,
}

impl Emulator {
    /// Constructs an idle board behind the given remote.
    pub fn new(remote: Remote) -> Self {
        Self {
            remote,
            buf: VecDeque::new(),
            status: VecDeque::new(),
            latest: 0x00,
            truncate_probe: false,
            regs: [0; 16],
            memory: HashMap::new(),
            output: VecDeque::new(),
            input: Vec::new(),
            active: 0,
            defined: u32::MAX,
            slots: [[0; RECORD]; 32],
            log: Vec::new(),
        }
    }

    /// Runs the board until the host hangs up, returning its final state.
    pub fn spawn(mut self) -> JoinHandle<Self> {
        thread::spawn(move || {
            while let Some(op) = self.byte() {
                self.exec(op);
            }
            self
        })
    }

    /// Executes one request.
    fn exec(&mut self, op: u8) {
        self.log.push(op);
        match op {
            // START: consume the step count
            0xB0 => {
                self.word(4);
            }
            // WOT_U_DO: status byte plus step counters
            0x20 => {
                let status = self.status.pop_front().unwrap_or(self.latest);
                self.latest = status;
                self.send(&[status]);
                if !self.truncate_probe {
                    self.send(&0u32.to_le_bytes());
                    self.send(&0u32.to_le_bytes());
                }
            }
            // STOP, CONTINUE, RESET: fire and forget
            0x21 | 0x23 | 0x04 => {}
            // FR_WRITE: record the payload, acknowledge
            0x12 => {
                let _terminal = self.byte().unwrap();
                let length = self.byte().unwrap();
                let chunk = self.take(length.into());
                self.input.extend_from_slice(&chunk);
                self.send(&[0]);
            }
            // FR_READ: replay the next scripted chunk
            0x13 => {
                let _terminal = self.byte().unwrap();
                let max = self.byte().unwrap();
                let chunk = self.output.pop_front().unwrap_or_default();
                assert!(chunk.len() <= max.into(), "scripted chunk too long");
                self.send(&[u8::try_from(chunk.len()).unwrap()]);
                self.send(&chunk);
            }
            // BP_WRITE: store the record, mark the slot live
            0x30 => {
                let slot = usize::from(self.byte().unwrap());
                let record = self.take(RECORD);
                self.slots[slot].copy_from_slice(&record);
                self.active |= 1 << slot;
            }
            // BP_READ: replay a record
            0x31 => {
                let slot = usize::from(self.byte().unwrap());
                let record = self.slots[slot];
                self.send(&record);
            }
            // BP_SET: clear then toggle the active bitmap
            0x32 => {
                let clear = self.word(4);
                let toggle = self.word(4);
                self.active = (self.active & !clear) ^ toggle;
            }
            // BP_GET: replay the bitmaps
            0x33 => {
                self.send(&self.active.to_le_bytes());
                self.send(&self.defined.to_le_bytes());
            }
            // GET_REG: replay the register file
            0x5A => {
                let _offset = self.word(4);
                let count = self.word(2);
                assert_eq!(count, 16);
                for reg in self.regs {
                    self.send(&reg.to_le_bytes());
                }
            }
            // GET_MEM: replay memory words (absent bytes read zero)
            0x4A => {
                let addr = self.word(4);
                let count = self.word(2);
                let bytes: Vec<u8> = (0..count * 4)
                    .map(|at| {
                        self.memory
                            .get(&addr.wrapping_add(at))
                            .copied()
                            .unwrap_or_default()
                    })
                    .collect();
                self.send(&bytes);
            }
            // SET_MEM: store elements of the encoded width
            op if op & 0xFC == 0x40 => {
                let size = [1, 2, 4, 8][usize::from(op & 0x03)];
                let addr = self.word(4);
                let count = self.word(2);
                let payload = self.take(count as usize * size);
                for (at, byte) in payload.into_iter().enumerate() {
                    self.memory.insert(addr.wrapping_add(at as u32), byte);
                }
            }
            op => panic!("unknown opcode: {op:#04x}"),
        }
    }

    /// Receives one request byte, or `None` once the host hangs up.
    fn byte(&mut self) -> Option<u8> {
        loop {
            if let Some(byte) = self.buf.pop_front() {
                return Some(byte);
            }
            self.buf.extend(self.remote.rx.recv().ok()?);
        }
    }

    /// Receives an exact run of request bytes.
    fn take(&mut self, count: usize) -> Vec<u8> {
        (0..count).map(|_| self.byte().unwrap()).collect()
    }

    /// Receives a little-endian request word.
    fn word(&mut self, count: usize) -> u32 {
        self.take(count)
            .into_iter()
            .rev()
            .fold(0, |word, byte| word << 8 | u32::from(byte))
    }

    /// Sends reply bytes (dropped once the host hangs up).
    ///
    /// Empty runs are skipped; the host reads a zero-length chunk as
    /// end-of-stream.
    fn send(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let _ = self.remote.tx.send(bytes.to_vec());
    }
}
