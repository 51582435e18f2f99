//! Board exchanges against the in-process double.

use std::thread::JoinHandle;

use jetty::board::ROWS;
use jetty::wire::Status;
use jetty::{Board, Link, Listing, link};

use crate::common::Emulator;

mod common;

/// Connects a board session to a fresh double.
fn setup(script: impl FnOnce(&mut Emulator)) -> (Board, JoinHandle<Emulator>) {
    let (link, remote): (Link, _) = link::pair();
    let mut emu = Emulator::new(remote);
    script(&mut emu);
    (Board::new(link), emu.spawn())
}

/// Reaps the double after hanging up on it.
fn teardown(board: Board, emu: JoinHandle<Emulator>) -> Emulator {
    drop(board);
    emu.join().unwrap()
}

#[test]
fn status_poll_works() {
    let (board, emu) = setup(|emu| {
        emu.status.extend([0x44, 0x41, 0x80]);
    });
    assert_eq!(board.status(), Status::Finished);
    assert_eq!(board.status(), Status::Breakpoint);
    assert_eq!(board.status(), Status::Running);
    // The script is exhausted; the last byte replays
    assert_eq!(board.status(), Status::Running);
    teardown(board, emu);
}

#[test]
fn status_unknown_coerces_works() {
    let (board, emu) = setup(|emu| {
        emu.status.extend([0x77, 0xFF]);
    });
    assert_eq!(board.status(), Status::Normal);
    assert_eq!(board.status(), Status::Normal);
    teardown(board, emu);
}

#[test]
fn status_short_read_breaks_works() {
    let (board, emu) = setup(|emu| {
        emu.truncate_probe = true;
    });
    assert_eq!(board.status(), Status::Broken);
    teardown(board, emu);
}

#[test]
fn start_gating_works() {
    // Halted: the start command reaches the wire with its step count
    let (board, emu) = setup(|_| ());
    board.start(5);
    let emu = teardown(board, emu);
    assert_eq!(emu.log, [0x20, 0xB0]);

    // Running: only the probe reaches the wire
    let (board, emu) = setup(|emu| {
        emu.status.push_back(0x80);
    });
    board.start(5);
    let emu = teardown(board, emu);
    assert_eq!(emu.log, [0x20]);
}

#[test]
fn resume_gating_works() {
    let (board, emu) = setup(|emu| {
        emu.status.push_back(0x41);
    });
    board.resume();
    let emu = teardown(board, emu);
    assert_eq!(emu.log, [0x20, 0x23]);

    let (board, emu) = setup(|emu| {
        emu.status.push_back(0x01);
    });
    board.resume();
    let emu = teardown(board, emu);
    assert_eq!(emu.log, [0x20]);
}

#[test]
fn pause_and_reset_always_emit_works() {
    let (board, emu) = setup(|emu| {
        emu.status.push_back(0x80);
    });
    board.pause();
    board.reset();
    let emu = teardown(board, emu);
    // Neither command probes first
    assert_eq!(emu.log, [0x21, 0x04]);
}

#[test]
fn breakpoint_toggle_works() {
    let (board, emu) = setup(|_| ());
    // First toggle claims the lowest slot
    assert!(board.toggle(0x1004));
    assert!(board.breakpoints().contains(&0x1004));
    // Second toggle clears it again
    assert!(!board.toggle(0x1004));
    assert!(board.breakpoints().is_empty());
    let emu = teardown(board, emu);
    assert_eq!(emu.active, 0);
}

#[test]
fn breakpoint_slot_record_works() {
    let (board, emu) = setup(|_| ());
    assert!(board.toggle(0xCAFE_F00D));
    let emu = teardown(board, emu);
    assert_eq!(emu.active, 1);
    let record = emu.slots[0];
    // misc, addressA, addressB, dataA, dataB
    assert_eq!(record[0..2], [0xFF, 0xFF]);
    assert_eq!(record[2..6], [0x0D, 0xF0, 0xFE, 0xCA]);
    assert_eq!(record[6..10], [0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(record[10..26], [0; 16]);
}

#[test]
fn breakpoint_capacity_works() {
    let (board, emu) = setup(|_| ());
    for point in 0..32 {
        assert!(board.toggle(0x8000 + 4 * point));
    }
    // A full table refuses further definitions
    assert!(!board.toggle(0xF000));
    assert_eq!(board.breakpoints().len(), 32);
    let emu = teardown(board, emu);
    assert_eq!(emu.active, u32::MAX);
    // The refused toggle only queried and scanned; no write reached slot 32
    assert!(!emu.log.contains(&0x32));
}

#[test]
fn breakpoint_defined_mask_works() {
    // The board only offers the low eight slots
    let (board, emu) = setup(|emu| {
        emu.defined = 0x0000_00FF;
    });
    for point in 0..8 {
        assert!(board.toggle(0x8000 + 4 * point));
    }
    assert!(!board.toggle(0xF000));
    let emu = teardown(board, emu);
    assert_eq!(emu.active, 0x0000_00FF);
}

#[test]
fn load_writes_memory_works() {
    let listing = Listing::parse("00001000: E3A00001 ; mov r0, #1\n00001004: 12 34 ; bytes\n");
    let (board, emu) = setup(|_| ());
    board.load(&listing);
    let emu = teardown(board, emu);
    // Words load least-significant byte first
    assert_eq!(emu.memory[&0x1000], 0x01);
    assert_eq!(emu.memory[&0x1001], 0x00);
    assert_eq!(emu.memory[&0x1002], 0xA0);
    assert_eq!(emu.memory[&0x1003], 0xE3);
    // Byte fields land at consecutive offsets
    assert_eq!(emu.memory[&0x1004], 0x12);
    assert_eq!(emu.memory[&0x1005], 0x34);
}

#[test]
fn load_and_view_works() {
    let listing = Listing::parse("00001000: E3A00001 ; mov r0, #1\n");
    let (board, emu) = setup(|_| ());
    board.load(&listing);
    let rows = board.view(0x1000, &listing);
    assert_eq!(rows.len(), ROWS);
    assert_eq!(rows[0].address, 0x1000);
    assert_eq!(rows[0].hex, "E3A00001    ");
    assert_eq!(rows[0].disassembly, "mov r0, #1");
    assert!(!rows[0].breakpoint);
    // Rows beyond the listing fall back to defaults
    assert_eq!(rows[1].address, 0x1004);
    assert_eq!(rows[1].hex, "00000000");
    assert_eq!(rows[1].disassembly, "...");
    teardown(board, emu);
}

#[test]
fn view_shape_works() {
    let listing = Listing::default();
    let (board, emu) = setup(|_| ());
    // An unaligned start snaps down to its word
    let rows = board.view(0x1003, &listing);
    assert_eq!(rows.len(), ROWS);
    assert_eq!(rows[0].address, 0x1000);
    for pair in rows.windows(2) {
        let step = pair[1].address - pair[0].address;
        assert!((1..=4).contains(&step));
    }
    assert_eq!(rows[12].address, 0x1000 + 48);
    teardown(board, emu);
}

#[test]
fn view_hex_reverses_fields_works() {
    // A halfword renders most-significant digit first
    let listing = Listing::parse("2000: 1122 3344 ; halves\n");
    let (board, emu) = setup(|_| ());
    board.load(&listing);
    let rows = board.view(0x2000, &listing);
    assert_eq!(rows[0].hex, "1122  3344  ");
    teardown(board, emu);
}

#[test]
fn view_flags_breakpoints_works() {
    let listing = Listing::parse("1000: E3A00001 ; mov r0, #1\n");
    let (board, emu) = setup(|_| ());
    board.load(&listing);
    assert!(board.toggle(0x1008));
    let rows = board.view(0x1000, &listing);
    assert!(!rows[0].breakpoint);
    assert!(rows[2].breakpoint);
    teardown(board, emu);
}

#[test]
fn view_strips_comments_works() {
    let listing = Listing::parse("1000: 01 ; add r0, r0 ; running total\n");
    let (board, emu) = setup(|_| ());
    let rows = board.view(0x1000, &listing);
    assert_eq!(rows[0].disassembly, "add r0, r0 ");
    teardown(board, emu);
}

#[test]
fn registers_render_works() {
    let (board, emu) = setup(|emu| {
        emu.regs[0] = 0xDEAD_BEEF;
        emu.regs[15] = 0x0000_8000;
    });
    let regs = board.registers();
    assert_eq!(regs.len(), 16);
    assert_eq!(regs[0], "0xDEADBEEF");
    assert_eq!(regs[1], "0x00000000");
    assert_eq!(regs[15], "0x00008000");
    teardown(board, emu);
}

#[test]
fn terminal_output_works() {
    let (board, emu) = setup(|emu| {
        emu.output.push_back(b"hi\n".to_vec());
    });
    // Chunks accumulate until the empty packet
    assert_eq!(board.pull(), "hi\n");
    assert_eq!(board.pull(), "");
    teardown(board, emu);
}

#[test]
fn terminal_output_chunked_works() {
    let (board, emu) = setup(|emu| {
        emu.output.push_back(b"hello, ".to_vec());
        emu.output.push_back(b"board\n".to_vec());
    });
    assert_eq!(board.pull(), "hello, board\n");
    teardown(board, emu);
}

#[test]
fn terminal_input_works() {
    let (board, emu) = setup(|_| ());
    assert!(board.push(u32::from(b'A')));
    assert!(board.push(u32::from(b'\n')));
    let emu = teardown(board, emu);
    assert_eq!(emu.input, b"A\n");
}

#[test]
fn terminal_input_rejection_works() {
    let (board, emu) = setup(|_| ());
    // Control codes outside the accepted set stay off the wire
    assert!(!board.push(0x01));
    assert!(!board.push(0x1B));
    assert!(!board.push(0x100));
    let emu = teardown(board, emu);
    assert!(emu.input.is_empty());
    assert!(emu.log.is_empty());
}
