use compiscript_common::{Quad, QuadOp};

/// Integer-to-ASCII conversion called by the `to_str` op: value in `$a0`,
/// byte width in `$a1`, heap string returned in `$v0`. Digits are written
/// back-to-front into a fresh sbrk allocation.
const TO_STRING: &str = "\
to_string:
move $t0, $a0
li $a0, 16
li $v0, 9
syscall
addi $t1, $v0, 15
sb $zero, ($t1)
li $t2, 10
to_string_digit:
addi $t1, $t1, -1
div $t0, $t2
mfhi $t3
addi $t3, $t3, 48
sb $t3, ($t1)
mflo $t0
bne $zero, $t0, to_string_digit
move $v0, $t1
jr $ra

";

/// String concatenation called by the `concat` op: copies the strings in
/// `$a0` and `$a1` into freshly sbrk-allocated storage, returning the new
/// string in `$v0`.
const CONCAT_STRING: &str = "\
concat_string:
move $t0, $a0
li $t1, 0
concat_measure_first:
lb $t2, ($t0)
beq $zero, $t2, concat_measure_second
addi $t0, $t0, 1
addi $t1, $t1, 1
b concat_measure_first
concat_measure_second:
move $t0, $a1
concat_measure_second_loop:
lb $t2, ($t0)
beq $zero, $t2, concat_allocate
addi $t0, $t0, 1
addi $t1, $t1, 1
b concat_measure_second_loop
concat_allocate:
move $t3, $a0
addi $a0, $t1, 1
li $v0, 9
syscall
move $a0, $t3
move $t0, $v0
concat_copy_first:
lb $t2, ($a0)
beq $zero, $t2, concat_copy_second
sb $t2, ($t0)
addi $a0, $a0, 1
addi $t0, $t0, 1
b concat_copy_first
concat_copy_second:
lb $t2, ($a1)
beq $zero, $t2, concat_terminate
sb $t2, ($t0)
addi $a1, $a1, 1
addi $t0, $t0, 1
b concat_copy_second
concat_terminate:
sb $zero, ($t0)
jr $ra

";

/// Bounds trap: prints the fixed message and halts the process.
const ERR_BAD_INDEX: &str = "\
err_bad_index:
la $a0, err_bad_index_msg
li $v0, 4
syscall
li $v0, 10
syscall

";

/// The helper routines required by the quadruple stream, each emitted once,
/// in front of user code, only when the corresponding op occurs.
pub fn required_helpers(quadruplets: &[Quad]) -> String {
    let mut helpers = String::new();
    if quadruplets.iter().any(|quad| quad.op == QuadOp::ToStr) {
        helpers.push_str(TO_STRING);
    }
    if quadruplets.iter().any(|quad| quad.op == QuadOp::Concat) {
        helpers.push_str(CONCAT_STRING);
    }
    if quadruplets.iter().any(|quad| quad.op == QuadOp::IfErr) {
        helpers.push_str(ERR_BAD_INDEX);
    }
    helpers
}
