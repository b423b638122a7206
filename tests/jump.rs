#[macro_use]
mod common;

use common::opc;

#[test]
fn absolute() {
    run!(opc: [opc::Jmp::Absolute, 0x05, 0x80, opc::Lda::Immediate, 0x01];
        res: [a => 0x00, pc => 0x8005]);
}

#[test]
fn indirect_doesnt_cross_page() {
    run!(opc: [
            opc::Jmp::Indirect, 0xff, 0x02,
            opc::Lda::Immediate, 0x01,
            opc::Implied::Nop, opc::Implied::Nop, opc::Implied::Nop, opc::Implied::Nop,
            opc::Implied::Inx
        ];
        ram: [0x2ff => 0x09, 0x200 => 0x80, 0x300 => 0x90];
        res: [a => 0x00, x => 0x01, pc => 0x800a]);
}

#[test]
fn subroutine() {
    run!(opc: [
            opc::Jsr::Absolute, 0x07, 0x80,
            opc::Implied::Inx,
            opc::Jmp::Absolute, 0x0a, 0x80,
            opc::Implied::Iny,
            opc::Implied::Rts,
            opc::Implied::Nop
        ];
        res: [x => 0x01, y => 0x01, s => 0xfd, pc => 0x800a];
        mem: [0x1fd => 0x80, 0x1fc => 0x02]);
}

#[test]
fn return_from_interrupt() {
    // Pushed by hand: return address 0x800a, then flags with B set
    run!(opc: [
            opc::Lda::Immediate, 0x80, opc::Implied::Pha,
            opc::Lda::Immediate, 0x0a, opc::Implied::Pha,
            opc::Lda::Immediate, 0xd3, opc::Implied::Pha,
            opc::Implied::Rti
        ];
        res: [s => 0xfd, pc => 0x800a];
        flags: [c => true, z => true, n => true, o => true]);
}
