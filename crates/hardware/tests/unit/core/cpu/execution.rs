//! Executor Unit Tests.
//!
//! Runs small programs end to end through `Simulator` and checks registers, flags,
//! memory and retirement counters. Memory faults, bad returns and the step budget are
//! checked for the error they raise and the state they leave behind.

use pretty_assertions::assert_eq;
use rstest::rstest;

use memsim_core::common::{ExecError, MemError};
use memsim_core::config::Config;

use crate::common::harness::TestContext;

// ══════════════════════════════════════════════════════════
// 1. Arithmetic and logic
// ══════════════════════════════════════════════════════════

#[test]
fn arithmetic_wraps_and_sets_registers() {
    let ctx = TestContext::new(
        "
        mov eax, 5
        add eax, 7
        sub eax, 2          ; 10
        mov ebx, 0x7FFFFFFF
        inc ebx             ; wraps to i32::MIN
        mov ecx, 6
        and ecx, 3          ; 2
        mov edx, 6
        or edx, 1           ; 7
        mov esi, 6
        xor esi, 6          ; 0
        mov edi, 1
        shl edi, 4          ; 16
        halt
        ",
    )
    .run();

    assert_eq!(ctx.reg("eax"), 10);
    assert_eq!(ctx.reg("ebx"), i32::MIN);
    assert_eq!(ctx.reg("ecx"), 2);
    assert_eq!(ctx.reg("edx"), 7);
    assert_eq!(ctx.reg("esi"), 0);
    assert_eq!(ctx.reg("edi"), 16);
}

#[test]
fn unary_and_shift_right() {
    let ctx = TestContext::new(
        "
        mov eax, 5
        neg eax             ; -5
        mov ebx, 0
        not ebx             ; -1
        shr ebx, 28         ; 15, logical
        mov ecx, 1
        dec ecx
        halt
        ",
    )
    .run();

    assert_eq!(ctx.reg("eax"), -5);
    assert_eq!(ctx.reg("ebx"), 15);
    assert_eq!(ctx.reg("ecx"), 0);
    assert!(ctx.sim.cpu.flags.zero);
}

#[test]
fn shift_out_of_top_bit_sets_carry_and_zero() {
    let ctx = TestContext::new(
        "
        mov eax, 0x80000000
        shl eax, 1
        halt
        ",
    )
    .run();
    assert_eq!(ctx.reg("eax"), 0);
    assert!(ctx.sim.cpu.flags.carry);
    assert!(ctx.sim.cpu.flags.zero);
}

// ══════════════════════════════════════════════════════════
// 2. Control flow
// ══════════════════════════════════════════════════════════

/// Conditional jumps compare signed values.
#[rstest]
#[case(1, 2, "jl", 1)]
#[case(2, 1, "jl", 0)]
#[case(-1, 1, "jl", 1)]
#[case(-1, 1, "jg", 0)]
#[case(3, 3, "jle", 1)]
#[case(3, 3, "jge", 1)]
#[case(3, 3, "jg", 0)]
#[case(4, 3, "jg", 1)]
#[case(3, 3, "je", 1)]
#[case(3, 4, "jne", 1)]
#[case(3, 3, "jne", 0)]
fn signed_conditional_jumps(
    #[case] a: i32,
    #[case] b: i32,
    #[case] jump: &str,
    #[case] taken: i32,
) {
    let source = format!(
        "
        mov eax, {a}
        cmp eax, {b}
        {jump} yes
        mov ebx, 0
        halt
    yes:
        mov ebx, 1
        halt
        "
    );
    let ctx = TestContext::new(&source).run();
    assert_eq!(ctx.reg("ebx"), taken);
    assert_eq!(ctx.sim.cpu.stats.branches_taken, u64::from(taken == 1));
}

#[test]
fn counted_loop_sums_into_memory() {
    let ctx = TestContext::new(
        "
        mov ecx, 10
        mov eax, 0
    loop:
        add eax, ecx
        dec ecx
        jne loop
        mov [100], eax
        halt
        ",
    )
    .run();

    assert_eq!(ctx.reg("eax"), 55);
    assert_eq!(ctx.mem(100), 55);

    let stats = &ctx.sim.cpu.stats;
    assert_eq!(stats.instructions_retired, 2 + 3 * 10 + 2);
    assert_eq!(stats.inst_branch, 10);
    assert_eq!(stats.branches_taken, 9);
    assert_eq!(stats.inst_store, 1);
    assert_eq!(stats.inst_system, 1);
}

#[test]
fn call_and_ret_use_the_stack() {
    let ctx = TestContext::new(
        "
        mov eax, 3
        call double
        mov [10], eax
        halt
    double:
        add eax, eax
        ret
        ",
    )
    .run();

    assert_eq!(ctx.reg("eax"), 6);
    assert_eq!(ctx.mem(10), 6);
    assert_eq!(ctx.reg("esp"), 1024);
    assert_eq!(ctx.mem(1023), 2, "return address");
    assert_eq!(ctx.sim.cpu.stats.inst_branch, 2);
}

#[test]
fn falling_off_the_end_halts() {
    let ctx = TestContext::new("mov eax, 1\nmov ebx, 2").run();
    assert!(ctx.sim.is_halted());
    assert_eq!(ctx.sim.cpu.pc, 2);
    assert_eq!(ctx.sim.cpu.stats.instructions_retired, 2);
}

#[test]
fn jump_to_trailing_label_ends_program() {
    let ctx = TestContext::new("jmp end\nmov eax, 1\nend:").run();
    assert_eq!(ctx.reg("eax"), 0);
    assert_eq!(ctx.sim.cpu.stats.instructions_retired, 1);
}

// ══════════════════════════════════════════════════════════
// 3. Memory and the hierarchy
// ══════════════════════════════════════════════════════════

#[test]
fn data_segment_is_summed_with_indexed_operands() {
    let ctx = TestContext::new(
        "
        .data 200 1 2 3 4
        mov esi, 200
        mov ecx, 4
        mov eax, 0
    next:
        add eax, [esi]
        inc esi
        dec ecx
        jne next
        mov [esi+1], eax    ; 205
        halt
        ",
    )
    .run();

    assert_eq!(ctx.reg("eax"), 10);
    assert_eq!(ctx.mem(205), 10);
    assert_eq!(ctx.sim.cpu.stats.mem_reads, 4);
    assert_eq!(ctx.sim.cpu.stats.mem_writes, 1);
}

#[test]
fn memory_latency_is_accumulated() {
    let ctx = TestContext::new(
        "
        mov eax, [5]        ; 1 + 10 + 100
        mov ebx, [5]        ; 1
        mov [6], eax        ; 1 + 10, stops at write-back L2
        halt
        ",
    )
    .run();

    let stats = &ctx.sim.cpu.stats;
    assert_eq!(stats.mem_latency_ns, 111 + 1 + 11);
    assert_eq!(stats.inst_load, 2);
    assert!((stats.avg_access_latency() - 41.0).abs() < 1e-9);
}

#[test]
fn flush_instruction_cleans_hierarchy() {
    let ctx = TestContext::new(
        "
        mov [7], 70
        flush
        halt
        ",
    )
    .run();

    assert_eq!(ctx.sim.memory.main_store().get(7), Some(70));
    assert!(
        ctx.sim
            .memory
            .snapshot()
            .levels
            .iter()
            .all(|l| l.dirty_count() == 0)
    );
}

#[test]
fn dump_records_snapshots() {
    let ctx = TestContext::new(
        "
        dump
        mov [3], 1
        dump
        halt
        ",
    )
    .run();

    let dumps = &ctx.sim.cpu.dumps;
    assert_eq!(dumps.len(), 2);
    assert_eq!(dumps[0].levels[0].valid_blocks().count(), 0);
    assert_eq!(dumps[1].levels[0].valid_blocks().count(), 1);
    assert_eq!(dumps[1].levels[1].dirty_count(), 1);
}

// ══════════════════════════════════════════════════════════
// 4. Faults
// ══════════════════════════════════════════════════════════

#[test]
fn out_of_range_load_faults_at_its_pc() {
    let mut ctx = TestContext::new("nop\nmov eax, [2000]\nhalt");
    let err = ctx.sim.run().unwrap_err();
    assert_eq!(
        err,
        ExecError::Memory {
            pc: 1,
            source: MemError::OutOfRange {
                addr: 2000,
                capacity: 1024
            }
        }
    );
    assert_eq!(ctx.sim.cpu.pc, 1, "faulting instruction is not retired");
    assert_eq!(ctx.sim.cpu.stats.instructions_retired, 1);
}

#[test]
fn negative_effective_address_faults() {
    let mut ctx = TestContext::new("mov esi, 2\nmov eax, [esi-3]");
    let err = ctx.sim.run().unwrap_err();
    assert!(matches!(
        err,
        ExecError::Memory {
            source: MemError::OutOfRange { addr: -1, .. },
            ..
        }
    ));
}

#[test]
fn stack_overflow_faults_without_moving_esp() {
    let mut config = Config::default();
    config.memory.capacity = 2;
    config.cache.levels.clear();
    let mut ctx = TestContext::with_config("push 1\npush 2\npush 3", &config);

    let err = ctx.sim.run().unwrap_err();
    assert!(matches!(
        err,
        ExecError::Memory {
            pc: 2,
            source: MemError::OutOfRange { addr: -1, .. }
        }
    ));
    assert_eq!(ctx.reg("esp"), 0);
}

#[test]
fn ret_to_invalid_target_is_rejected() {
    let mut ctx = TestContext::new("push 99\nret");
    assert_eq!(
        ctx.sim.run(),
        Err(ExecError::BadReturn { pc: 1, target: 99 })
    );
}

#[test]
fn step_limit_stops_infinite_loop() {
    let mut config = Config::default();
    config.general.max_steps = 50;
    let mut ctx = TestContext::with_config("top: jmp top", &config);

    assert_eq!(
        ctx.sim.run(),
        Err(ExecError::StepLimitExceeded { limit: 50 })
    );
    assert_eq!(ctx.sim.cpu.stats.instructions_retired, 50);
}

#[test]
fn program_finishing_exactly_at_limit_succeeds() {
    let mut config = Config::default();
    config.general.max_steps = 2;
    let ctx = TestContext::with_config("nop\nnop", &config).run();
    assert!(ctx.sim.is_halted());
}
