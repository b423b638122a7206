#[macro_use]
mod common;

use common::opc;

#[test]
fn push_and_pull() {
    run!(opc: [
            opc::Lda::Immediate, 0x42, opc::Implied::Pha,
            opc::Lda::Immediate, 0x00, opc::Implied::Pla
        ];
        res: [a => 0x42, s => 0xfd];
        flags: [z => false]);
}

#[test]
fn pla_sets_flags() {
    run!(opc: [opc::Implied::Pla];
        ram: [0x1fe => 0x80];
        res: [a => 0x80, s => 0xfe];
        flags: [n => true]);
}

#[test]
fn php_sets_break_and_unused() {
    run!(opc: [opc::Implied::Sec, opc::Implied::Php];
        res: [s => 0xfc];
        mem: [0x1fd => 0x35]);
}

#[test]
fn plp_ignores_break() {
    let (cpu, _) = run!(opc: [opc::Lda::Immediate, 0xff, opc::Implied::Pha, opc::Implied::Plp];
        flags: [c => true, z => true, i => true, d => true, o => true, n => true]);
    let p: u8 = cpu.reg.p.into();
    assert_eq!(p, 0xef);
}

#[test]
fn stack_pointer_wraps() {
    run!(opc: [opc::Lda::Immediate, 0x99, opc::Implied::Pha, opc::Implied::Pha];
        reg: [s => 0x00];
        res: [s => 0xfe];
        mem: [0x100 => 0x99, 0x1ff => 0x99]);
}

#[test]
fn brk_pushes_state() {
    let (cpu, memory) = run!(opc: [opc::Implied::Brk, 0x00];
        res: [pc => common::IRQ_HANDLER, s => 0xfa];
        flags: [i => true]);
    assert_eq!(memory.at(0x1fd), 0x80);
    assert_eq!(memory.at(0x1fc), 0x02);
    assert_eq!(memory.at(0x1fb), 0x34);
    assert!(!cpu.is_jammed());
}
