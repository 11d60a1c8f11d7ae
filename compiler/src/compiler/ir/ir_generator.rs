use compiscript_common::{Operand, Quad, QuadOp, SpecialReg, TacProgram};

use super::super::ast::cst::{BinaryOp, CstNode, Suffix, SwitchCase, UnaryOp};
use super::super::ast::symbol::{Symbol, SymbolDataType, SymbolKind};
use super::super::ast::SymbolTable;

/// IrGenerator walks the CST a second time and lowers it into the quadruple
/// stream. The scope tree built by the analyser is replayed with
/// `enter`/`exit` in the same order the analyser created it, so symbol
/// lookups resolve against the correct scopes.
///
/// Quadruples of the statement under generation are staged in the `optimize`
/// buffer and flushed at statement boundaries; the flush is the future
/// peephole hook and currently only appends. Statement-local temporaries
/// `t0..` restart at every flush; code labels `l0..` count up across the
/// whole program.
pub struct IrGenerator {
    table: SymbolTable,
    quadruplets: Vec<Quad>,
    optimize: Vec<Quad>,
    temp_count: usize,
    label_count: usize,
    /// Loop scope for `continue`/`break`.
    begin_label: String,
    end_label: String,
    /// Target names of the locals live at the current call site; pushed and
    /// popped around calls so the callee can reuse temporaries.
    registry: Vec<Operand>,
    func_def: bool,
    class_def: bool,
    /// Target name of the receiver inside the method under generation.
    this_label: Option<String>,
}

impl IrGenerator {
    pub fn new(table: SymbolTable) -> Self {
        IrGenerator {
            table,
            quadruplets: Vec::new(),
            optimize: Vec::new(),
            temp_count: 0,
            label_count: 0,
            begin_label: String::new(),
            end_label: String::new(),
            registry: Vec::new(),
            func_def: false,
            class_def: false,
            this_label: None,
        }
    }

    /// Lower a whole program, consuming the generator and yielding the
    /// quadruple stream together with the replayed scope tree.
    pub fn generate(mut self, root: &CstNode) -> (TacProgram, SymbolTable) {
        let statements = match root {
            CstNode::Program { statements } => statements,
            node => panic!("Malformed CST! Expected a program root, found {:?}", node),
        };
        self.table.reset_walk();
        for statement in statements {
            self.generate_statement(statement);
        }
        (TacProgram::new(self.quadruplets), self.table)
    }

    fn emit(&mut self, op: QuadOp, arg1: Operand, arg2: Operand, result: Operand) {
        self.optimize.push(Quad::new(op, arg1, arg2, result));
    }

    /// Statement-boundary flush of the staging buffer. The hook exists for
    /// peephole rewrites; the current contract is to append directly.
    fn optimize_quadruplets(&mut self) {
        self.quadruplets.append(&mut self.optimize);
        self.temp_count = 0;
    }

    fn next_temp(&mut self) -> Operand {
        let temp = Operand::StackTemp(format!("t{}", self.temp_count));
        self.temp_count += 1;
        temp
    }

    fn next_label(&mut self) -> String {
        let label = format!("l{}", self.label_count);
        self.label_count += 1;
        label
    }

    fn generate_statement(&mut self, node: &CstNode) {
        match node {
            CstNode::Block { statements, .. } => {
                self.table.enter();
                for statement in statements {
                    self.generate_statement(statement);
                }
                self.table.exit();
            }
            CstNode::VariableDeclaration { name, initializer, .. } => {
                // Class properties are layout slots; only offsets matter.
                if !(self.class_def && !self.func_def) {
                    self.generate_declaration(name, initializer.as_deref());
                }
            }
            CstNode::ConstantDeclaration { name, initializer, .. } => {
                if !(self.class_def && !self.func_def) {
                    self.generate_declaration(name, Some(initializer.as_ref()));
                }
            }
            CstNode::Assignment { target, expression, .. } => {
                self.generate_assignment(target, expression);
            }
            CstNode::ExpressionStatement { expression, .. } => {
                self.generate_expression(expression);
            }
            CstNode::PrintStatement { expression, .. } => {
                self.generate_print_statement(expression);
            }
            CstNode::IfStatement { condition, then_block, else_block, .. } => {
                self.generate_if_statement(condition, then_block, else_block.as_deref());
            }
            CstNode::WhileStatement { condition, body, .. } => {
                self.generate_while_statement(condition, body);
            }
            CstNode::DoWhileStatement { body, condition, .. } => {
                self.generate_do_while_statement(body, condition);
            }
            CstNode::ForStatement { init, condition, advancement, body, .. } => {
                self.generate_for_statement(
                    init.as_deref(),
                    condition.as_deref(),
                    advancement.as_deref(),
                    body,
                );
            }
            CstNode::ForeachStatement { variable, iterable, body, .. } => {
                self.generate_foreach_statement(variable, iterable, body);
            }
            CstNode::TryCatchStatement { try_block, variable, catch_block, .. } => {
                self.generate_try_catch_statement(try_block, variable, catch_block);
            }
            CstNode::SwitchStatement { condition, cases, default, .. } => {
                self.generate_switch_statement(condition, cases, default.as_deref());
            }
            CstNode::BreakStatement { .. } => {
                let label = self.end_label.clone();
                self.emit(QuadOp::Goto, Operand::Label(label), Operand::None, Operand::None);
            }
            CstNode::ContinueStatement { .. } => {
                let label = self.begin_label.clone();
                self.emit(QuadOp::Goto, Operand::Label(label), Operand::None, Operand::None);
            }
            CstNode::ReturnStatement { expression, .. } => {
                let operand = match expression {
                    Some(expression) => self.generate_expression(expression).0,
                    None => Operand::None,
                };
                self.emit(QuadOp::Return, operand, Operand::None, Operand::None);
            }
            CstNode::FunctionDeclaration { name, body, .. } => {
                self.generate_function_declaration(name, body);
            }
            CstNode::ClassDeclaration { members, .. } => {
                self.generate_class_declaration(members);
            }
            expression => {
                self.generate_expression(expression);
            }
        }
        self.optimize_quadruplets();
    }

    fn block_statements<'a>(node: &'a CstNode) -> &'a [CstNode] {
        match node {
            CstNode::Block { statements, .. } => statements,
            node => panic!("Malformed CST! Expected a block, found {:?}", node),
        }
    }

    fn generate_declaration(&mut self, name: &str, initializer: Option<&CstNode>) {
        let symbol = self
            .table
            .lookup(name)
            .expect("declared symbol exists after analysis")
            .clone();
        let target = Operand::ScopedLocal(symbol.target_name());

        if let Some(initializer) = initializer {
            if symbol.is_array() && matches!(initializer, CstNode::ArrayLiteral { .. }) {
                self.generate_array_initialization(&symbol, &target, initializer);
            } else {
                let (operand, _) = self.generate_expression(initializer);
                self.emit(QuadOp::Assign, operand, Operand::None, target.clone());
            }
        }

        if self.func_def {
            self.registry.push(target);
        }
    }

    /// Compile-time array initialization: allocate the backing storage and
    /// store the literal elements through `i`.
    fn generate_array_initialization(&mut self, symbol: &Symbol, target: &Operand, literal: &CstNode) {
        self.emit(
            QuadOp::Alloc,
            Operand::Immediate(symbol.size.to_string()),
            Operand::None,
            target.clone(),
        );
        self.generate_array_store(symbol, target, 0, literal);
    }

    /// Store the flattened elements of an array literal at their scaled
    /// offsets from the storage base.
    fn generate_array_store(
        &mut self,
        symbol: &Symbol,
        base: &Operand,
        offset: usize,
        literal: &CstNode,
    ) {
        let scalar = symbol.scalar_element_size();
        let byte = matches!(
            symbol.data_type,
            SymbolDataType::Boolean | SymbolDataType::Nil
        );
        for (index, value) in Self::array_literal_values(literal).into_iter().enumerate() {
            self.emit(
                QuadOp::Add,
                base.clone(),
                Operand::Immediate((offset + index * scalar).to_string()),
                Operand::AddressReg,
            );
            self.emit(
                QuadOp::Assign,
                Operand::Immediate(value),
                Operand::None,
                Operand::AddressRegDeref { byte },
            );
        }
    }

    /// The leaf literal texts of a (possibly nested) array literal, in
    /// element order.
    fn array_literal_values(literal: &CstNode) -> Vec<String> {
        let mut values = Vec::new();
        Self::collect_array_values(literal, &mut values);
        values
    }

    fn collect_array_values(node: &CstNode, values: &mut Vec<String>) {
        match node {
            CstNode::ArrayLiteral { elements, .. } => {
                for element in elements {
                    Self::collect_array_values(element, values);
                }
            }
            CstNode::Literal { text, .. } => values.push(text.clone()),
            _ => {}
        }
    }

    fn generate_assignment(&mut self, target: &CstNode, expression: &CstNode) {
        let (atom, suffixes) = match target {
            CstNode::LeftHandSide { atom, suffixes, .. } => (atom.as_ref(), suffixes.as_slice()),
            node => panic!("Malformed CST! Assignment target should be a left hand side, found {:?}", node),
        };

        match suffixes.last() {
            Some(Suffix::Property { name, .. }) => {
                let (object_operand, object_symbol) =
                    self.generate_left_hand_side(atom, &suffixes[..suffixes.len() - 1]);
                let property = self
                    .table
                    .get_property(&object_symbol.parent, name)
                    .expect("property exists after analysis")
                    .clone();

                // An array-literal value re-stores the elements behind the
                // property offset.
                if property.is_array() && matches!(expression, CstNode::ArrayLiteral { .. }) {
                    let mut base = object_operand;
                    if matches!(base, Operand::AddressReg | Operand::AddressRegDeref { .. }) {
                        let temp = self.next_temp();
                        self.emit(QuadOp::Assign, base, Operand::None, temp.clone());
                        base = temp;
                    }
                    self.generate_array_store(&property, &base, property.offset, expression);
                    return;
                }

                let (mut value, _) = self.generate_expression(expression);
                // A value read through `i` must be saved before the store
                // address overwrites `i`.
                if matches!(value, Operand::AddressReg | Operand::AddressRegDeref { .. }) {
                    let temp = self.next_temp();
                    self.emit(QuadOp::Assign, value, Operand::None, temp.clone());
                    value = temp;
                }
                self.emit(
                    QuadOp::Add,
                    object_operand,
                    Operand::Immediate(property.offset.to_string()),
                    Operand::AddressReg,
                );
                self.emit(
                    QuadOp::Assign,
                    value,
                    Operand::None,
                    Operand::AddressRegDeref { byte: property.is_byte_sized() },
                );
            }
            _ => {
                let name = match atom {
                    CstNode::IdentifierExpr { name, .. } => name,
                    node => panic!("Malformed CST! Assignment target should be an identifier, found {:?}", node),
                };
                let symbol = self
                    .table
                    .lookup(name)
                    .expect("assigned symbol exists after analysis")
                    .clone();
                let target = Operand::ScopedLocal(symbol.target_name());

                // An array-literal value re-stores the elements into the
                // storage the declaration allocated.
                if symbol.is_array() && matches!(expression, CstNode::ArrayLiteral { .. }) {
                    self.generate_array_store(&symbol, &target, 0, expression);
                    return;
                }

                let (value, _) = self.generate_expression(expression);
                self.emit(QuadOp::Assign, value, Operand::None, target);
            }
        }
    }

    fn generate_print_statement(&mut self, expression: &CstNode) {
        let (operand, symbol) = self.generate_expression(expression);
        if symbol.data_type == SymbolDataType::String {
            self.emit(
                QuadOp::Assign,
                operand,
                Operand::None,
                Operand::Special(SpecialReg::Print),
            );
        } else {
            self.emit(
                QuadOp::ToStr,
                operand,
                Operand::Immediate(symbol.data_type.scalar_size().to_string()),
                Operand::Special(SpecialReg::Print),
            );
        }
        self.emit(QuadOp::Print, Operand::None, Operand::None, Operand::None);
    }

    fn generate_if_statement(
        &mut self,
        condition: &CstNode,
        then_block: &CstNode,
        else_block: Option<&CstNode>,
    ) {
        let (condition_operand, _) = self.generate_expression(condition);
        let label_true = self.next_label();
        let label_false = self.next_label();

        self.emit(
            QuadOp::If,
            condition_operand,
            Operand::Label(label_true.clone()),
            Operand::None,
        );
        self.emit(
            QuadOp::Goto,
            Operand::Label(label_false.clone()),
            Operand::None,
            Operand::None,
        );
        self.emit(QuadOp::Tag, Operand::Label(label_true), Operand::None, Operand::None);

        self.table.enter();
        for statement in Self::block_statements(then_block) {
            self.generate_statement(statement);
        }
        self.table.exit();

        self.emit(QuadOp::Tag, Operand::Label(label_false), Operand::None, Operand::None);

        if let Some(else_block) = else_block {
            self.table.enter();
            for statement in Self::block_statements(else_block) {
                self.generate_statement(statement);
            }
            self.table.exit();
        }
    }

    fn generate_while_statement(&mut self, condition: &CstNode, body: &CstNode) {
        let label_begin = self.next_label();
        let label_end = self.next_label();
        let saved_begin = std::mem::replace(&mut self.begin_label, label_begin.clone());
        let saved_end = std::mem::replace(&mut self.end_label, label_end.clone());

        self.emit(
            QuadOp::Tag,
            Operand::Label(label_begin.clone()),
            Operand::None,
            Operand::None,
        );
        let (condition_operand, _) = self.generate_expression(condition);
        self.emit(
            QuadOp::IfNot,
            condition_operand,
            Operand::Label(label_end.clone()),
            Operand::None,
        );

        self.table.enter();
        for statement in Self::block_statements(body) {
            self.generate_statement(statement);
        }
        self.table.exit();

        self.emit(QuadOp::Goto, Operand::Label(label_begin), Operand::None, Operand::None);
        self.emit(QuadOp::Tag, Operand::Label(label_end), Operand::None, Operand::None);

        self.begin_label = saved_begin;
        self.end_label = saved_end;
    }

    fn generate_do_while_statement(&mut self, body: &CstNode, condition: &CstNode) {
        let label_begin = self.next_label();
        let label_end = self.next_label();
        let saved_begin = std::mem::replace(&mut self.begin_label, label_begin.clone());
        let saved_end = std::mem::replace(&mut self.end_label, label_end.clone());

        self.emit(
            QuadOp::Tag,
            Operand::Label(label_begin.clone()),
            Operand::None,
            Operand::None,
        );

        self.table.enter();
        for statement in Self::block_statements(body) {
            self.generate_statement(statement);
        }
        self.table.exit();

        let (condition_operand, _) = self.generate_expression(condition);
        self.emit(
            QuadOp::If,
            condition_operand,
            Operand::Label(label_begin),
            Operand::None,
        );
        self.emit(QuadOp::Tag, Operand::Label(label_end), Operand::None, Operand::None);

        self.begin_label = saved_begin;
        self.end_label = saved_end;
    }

    fn generate_for_statement(
        &mut self,
        init: Option<&CstNode>,
        condition: Option<&CstNode>,
        advancement: Option<&CstNode>,
        body: &CstNode,
    ) {
        self.table.enter();
        if let Some(init) = init {
            self.generate_statement(init);
        }

        let label_begin = self.next_label();
        let label_end = self.next_label();
        let saved_begin = std::mem::replace(&mut self.begin_label, label_begin.clone());
        let saved_end = std::mem::replace(&mut self.end_label, label_end.clone());

        self.emit(
            QuadOp::Tag,
            Operand::Label(label_begin.clone()),
            Operand::None,
            Operand::None,
        );
        if let Some(condition) = condition {
            let (condition_operand, _) = self.generate_expression(condition);
            self.emit(
                QuadOp::IfNot,
                condition_operand,
                Operand::Label(label_end.clone()),
                Operand::None,
            );
        }

        for statement in Self::block_statements(body) {
            self.generate_statement(statement);
        }

        if let Some(advancement) = advancement {
            self.generate_statement(advancement);
        }

        self.emit(QuadOp::Goto, Operand::Label(label_begin), Operand::None, Operand::None);
        self.emit(QuadOp::Tag, Operand::Label(label_end), Operand::None, Operand::None);

        self.begin_label = saved_begin;
        self.end_label = saved_end;
        self.table.exit();
    }

    /// Foreach walks the array with the cursor register: load the element,
    /// run the body, advance by the element stride and loop while the cursor
    /// is below the end of the array.
    fn generate_foreach_statement(&mut self, variable: &str, iterable: &CstNode, body: &CstNode) {
        let (array_operand, array_symbol) = self.generate_expression(iterable);

        self.table.enter();
        let element = self
            .table
            .lookup(variable)
            .expect("foreach variable exists after analysis")
            .clone();
        let element_target = Operand::ScopedLocal(element.target_name());
        if self.func_def {
            self.registry.push(element_target.clone());
        }

        let label_begin = self.next_label();
        let label_end = self.next_label();
        let saved_begin = std::mem::replace(&mut self.begin_label, label_begin.clone());
        let saved_end = std::mem::replace(&mut self.end_label, label_end.clone());

        self.emit(
            QuadOp::Assign,
            array_operand.clone(),
            Operand::None,
            Operand::AddressReg,
        );
        self.emit(
            QuadOp::Tag,
            Operand::Label(label_begin.clone()),
            Operand::None,
            Operand::None,
        );
        let element_value = if element.is_array() {
            Operand::AddressReg
        } else {
            Operand::AddressRegDeref { byte: element.is_byte_sized() }
        };
        self.emit(QuadOp::Assign, element_value, Operand::None, element_target);

        for statement in Self::block_statements(body) {
            self.generate_statement(statement);
        }

        let stride = array_symbol.element_stride();
        self.emit(
            QuadOp::Add,
            Operand::AddressReg,
            Operand::Immediate(stride.to_string()),
            Operand::AddressReg,
        );
        let end_address = self.next_temp();
        self.emit(
            QuadOp::Add,
            array_operand,
            Operand::Immediate(array_symbol.size.to_string()),
            end_address.clone(),
        );
        let comparison = self.next_temp();
        self.emit(
            QuadOp::Less,
            Operand::AddressReg,
            end_address,
            comparison.clone(),
        );
        self.emit(QuadOp::If, comparison, Operand::Label(label_begin), Operand::None);
        self.emit(QuadOp::Tag, Operand::Label(label_end), Operand::None, Operand::None);

        self.begin_label = saved_begin;
        self.end_label = saved_end;
        self.table.exit();
    }

    /// try/catch installs the handler label in `catch`, clears it after the
    /// protected block, and emits the handler as a bracketed subroutine that
    /// first copies `err` into the caught variable.
    fn generate_try_catch_statement(
        &mut self,
        try_block: &CstNode,
        variable: &str,
        catch_block: &CstNode,
    ) {
        let label_catch = self.next_label();

        self.emit(
            QuadOp::Assign,
            Operand::Label(label_catch.clone()),
            Operand::None,
            Operand::Special(SpecialReg::Catch),
        );

        self.table.enter();
        for statement in Self::block_statements(try_block) {
            self.generate_statement(statement);
        }
        self.table.exit();

        self.emit(
            QuadOp::Assign,
            Operand::Immediate(String::from("0")),
            Operand::None,
            Operand::Special(SpecialReg::Catch),
        );

        self.emit(
            QuadOp::Begin,
            Operand::Label(label_catch.clone()),
            Operand::None,
            Operand::None,
        );
        self.table.enter();
        let caught = self
            .table
            .lookup(variable)
            .expect("caught variable exists after analysis")
            .clone();
        let caught_target = Operand::ScopedLocal(caught.target_name());
        if self.func_def {
            self.registry.push(caught_target.clone());
        }
        self.emit(
            QuadOp::Assign,
            Operand::Special(SpecialReg::Err),
            Operand::None,
            caught_target,
        );
        for statement in Self::block_statements(catch_block) {
            self.generate_statement(statement);
        }
        self.table.exit();
        self.emit(QuadOp::End, Operand::Label(label_catch), Operand::None, Operand::None);
    }

    fn generate_switch_statement(
        &mut self,
        condition: &CstNode,
        cases: &[SwitchCase],
        default: Option<&[CstNode]>,
    ) {
        let (condition_operand, _) = self.generate_expression(condition);
        self.emit(
            QuadOp::Assign,
            condition_operand,
            Operand::None,
            Operand::Special(SpecialReg::Switch),
        );

        let case_labels: Vec<String> = cases.iter().map(|_| self.next_label()).collect();
        let label_end = self.next_label();

        for (case, label_next) in cases.iter().zip(case_labels) {
            let (value_operand, _) = self.generate_expression(&case.value);
            self.emit(
                QuadOp::Equal,
                Operand::Special(SpecialReg::Switch),
                value_operand,
                Operand::Special(SpecialReg::Case),
            );
            self.emit(
                QuadOp::IfNot,
                Operand::Special(SpecialReg::Case),
                Operand::Label(label_next.clone()),
                Operand::None,
            );

            self.table.enter();
            for statement in &case.statements {
                self.generate_statement(statement);
            }
            self.table.exit();

            self.emit(
                QuadOp::Goto,
                Operand::Label(label_end.clone()),
                Operand::None,
                Operand::None,
            );
            self.emit(QuadOp::Tag, Operand::Label(label_next), Operand::None, Operand::None);
        }

        if let Some(statements) = default {
            self.table.enter();
            for statement in statements {
                self.generate_statement(statement);
            }
            self.table.exit();
        }

        self.emit(QuadOp::Tag, Operand::Label(label_end), Operand::None, Operand::None);
    }

    /// Function bodies are bracketed by `begin`/`end` and list their
    /// parameters with `arg`. Methods take the receiver as an implicit first
    /// argument named after the body scope.
    fn generate_function_declaration(&mut self, name: &str, body: &CstNode) {
        let symbol = self
            .table
            .lookup(name)
            .expect("function symbol exists after analysis")
            .clone();
        let function_label = symbol.target_name();

        let saved_registry = std::mem::take(&mut self.registry);
        let saved_func_def = self.func_def;
        let saved_this = self.this_label.take();
        self.func_def = true;

        self.emit(
            QuadOp::Begin,
            Operand::Label(function_label.clone()),
            Operand::None,
            Operand::None,
        );
        self.table.enter();

        if self.class_def {
            let this_name = format!("S{}_this", self.table.current_scope());
            self.emit(
                QuadOp::Arg,
                Operand::ScopedLocal(this_name.clone()),
                Operand::None,
                Operand::None,
            );
            self.registry.push(Operand::ScopedLocal(this_name.clone()));
            self.this_label = Some(this_name);
        }

        for parameter in &symbol.arg_list {
            let parameter_symbol = self
                .table
                .lookup(&parameter.name)
                .expect("parameter symbol exists after analysis")
                .clone();
            let target = Operand::ScopedLocal(parameter_symbol.target_name());
            self.emit(QuadOp::Arg, target.clone(), Operand::None, Operand::None);
            self.registry.push(target);
        }

        for statement in Self::block_statements(body) {
            self.generate_statement(statement);
        }

        self.table.exit();
        self.emit(QuadOp::End, Operand::Label(function_label), Operand::None, Operand::None);

        self.func_def = saved_func_def;
        self.registry = saved_registry;
        self.this_label = saved_this;
    }

    fn generate_class_declaration(&mut self, members: &[CstNode]) {
        let saved_class_def = self.class_def;
        self.class_def = true;
        self.table.enter();
        for member in members {
            self.generate_statement(member);
        }
        self.table.exit();
        self.class_def = saved_class_def;
    }

    fn generate_expression(&mut self, node: &CstNode) -> (Operand, Symbol) {
        match node {
            CstNode::Literal { text, kind, .. } => {
                (Operand::Immediate(text.clone()), Symbol::from_literal(text, *kind))
            }
            CstNode::ArrayLiteral { .. } => {
                panic!("Array literals can only be used for direct assignment!")
            }
            CstNode::TernaryExpr { condition, true_branch, false_branch, .. } => {
                self.generate_ternary(condition, true_branch, false_branch)
            }
            CstNode::BinaryExpr { op, lhs, rhs, .. } => self.generate_binary(*op, lhs, rhs),
            CstNode::UnaryExpr { op, expression, .. } => self.generate_unary(*op, expression),
            CstNode::LeftHandSide { atom, suffixes, .. } => {
                self.generate_left_hand_side(atom, suffixes)
            }
            node => panic!("Malformed CST! Node {:?} is not an expression", node),
        }
    }

    fn generate_ternary(
        &mut self,
        condition: &CstNode,
        true_branch: &CstNode,
        false_branch: &CstNode,
    ) -> (Operand, Symbol) {
        let result = self.next_temp();
        let label_false = self.next_label();
        let label_end = self.next_label();

        let (condition_operand, _) = self.generate_expression(condition);
        self.emit(
            QuadOp::IfNot,
            condition_operand,
            Operand::Label(label_false.clone()),
            Operand::None,
        );

        let (true_operand, mut symbol) = self.generate_expression(true_branch);
        self.emit(QuadOp::Assign, true_operand, Operand::None, result.clone());
        self.emit(
            QuadOp::Goto,
            Operand::Label(label_end.clone()),
            Operand::None,
            Operand::None,
        );
        self.emit(QuadOp::Tag, Operand::Label(label_false), Operand::None, Operand::None);

        let (false_operand, _) = self.generate_expression(false_branch);
        self.emit(QuadOp::Assign, false_operand, Operand::None, result.clone());
        self.emit(QuadOp::Tag, Operand::Label(label_end), Operand::None, Operand::None);

        symbol.kind = SymbolKind::Variable;
        symbol.value.clear();
        (result, symbol)
    }

    fn generate_binary(&mut self, op: BinaryOp, lhs: &CstNode, rhs: &CstNode) -> (Operand, Symbol) {
        let (lhs_operand, lhs_symbol) = self.generate_expression(lhs);
        let (rhs_operand, rhs_symbol) = self.generate_expression(rhs);

        // String operators lower to the runtime forms.
        if lhs_symbol.data_type == SymbolDataType::String {
            match op {
                BinaryOp::Add => {
                    let mut rhs_operand = rhs_operand;
                    if rhs_symbol.data_type != SymbolDataType::String {
                        let coerced = self.next_temp();
                        self.emit(
                            QuadOp::ToStr,
                            rhs_operand,
                            Operand::Immediate(rhs_symbol.data_type.scalar_size().to_string()),
                            coerced.clone(),
                        );
                        rhs_operand = coerced;
                    }
                    let result = self.next_temp();
                    self.emit(QuadOp::Concat, lhs_operand, rhs_operand, result.clone());
                    return (
                        result,
                        Symbol::new(String::new(), SymbolKind::Variable, SymbolDataType::String),
                    );
                }
                BinaryOp::Equal | BinaryOp::NotEqual => {
                    let quad_op = if op == BinaryOp::Equal {
                        QuadOp::StrEql
                    } else {
                        QuadOp::StrNeq
                    };
                    let result = self.next_temp();
                    self.emit(quad_op, lhs_operand, rhs_operand, result.clone());
                    return (
                        result,
                        Symbol::new(String::new(), SymbolKind::Variable, SymbolDataType::Boolean),
                    );
                }
                _ => {}
            }
        }

        let (quad_op, data_type) = match op {
            BinaryOp::Add => (QuadOp::Add, SymbolDataType::Integer),
            BinaryOp::Sub => (QuadOp::Sub, SymbolDataType::Integer),
            BinaryOp::Mul => (QuadOp::Mul, SymbolDataType::Integer),
            BinaryOp::Div => (QuadOp::Div, SymbolDataType::Integer),
            BinaryOp::Less => (QuadOp::Less, SymbolDataType::Boolean),
            BinaryOp::Greater => (QuadOp::Greater, SymbolDataType::Boolean),
            BinaryOp::LessEqual => (QuadOp::LessEqual, SymbolDataType::Boolean),
            BinaryOp::GreaterEqual => (QuadOp::GreaterEqual, SymbolDataType::Boolean),
            BinaryOp::Equal => (QuadOp::Equal, SymbolDataType::Boolean),
            BinaryOp::NotEqual => (QuadOp::NotEqual, SymbolDataType::Boolean),
            BinaryOp::And => (QuadOp::And, SymbolDataType::Boolean),
            BinaryOp::Or => (QuadOp::Or, SymbolDataType::Boolean),
        };
        let result = self.next_temp();
        self.emit(quad_op, lhs_operand, rhs_operand, result.clone());
        (result, Symbol::new(String::new(), SymbolKind::Variable, data_type))
    }

    fn generate_unary(&mut self, op: UnaryOp, expression: &CstNode) -> (Operand, Symbol) {
        let (operand, symbol) = self.generate_expression(expression);
        let (quad_op, data_type) = match op {
            UnaryOp::Not => (QuadOp::Not, SymbolDataType::Boolean),
            UnaryOp::Negate => (QuadOp::Sub, symbol.data_type),
        };
        let result = self.next_temp();
        self.emit(quad_op, operand, Operand::None, result.clone());
        (result, Symbol::new(String::new(), SymbolKind::Variable, data_type))
    }

    fn generate_left_hand_side(&mut self, atom: &CstNode, suffixes: &[Suffix]) -> (Operand, Symbol) {
        let (mut operand, mut symbol) = match atom {
            CstNode::IdentifierExpr { name, .. } => {
                let symbol = self
                    .table
                    .lookup(name)
                    .expect("identifier exists after analysis")
                    .clone();
                let operand = match symbol.kind {
                    SymbolKind::Function | SymbolKind::Class => {
                        Operand::Label(symbol.target_name())
                    }
                    _ => Operand::ScopedLocal(symbol.target_name()),
                };
                (operand, symbol)
            }
            CstNode::NewExpr { class, arguments, .. } => {
                self.generate_new_expression(class, arguments)
            }
            CstNode::ThisExpr { .. } => {
                let symbol = self
                    .table
                    .lookup("this")
                    .expect("receiver exists after analysis")
                    .clone();
                let this_name = self
                    .this_label
                    .clone()
                    .expect("receiver is only addressed inside a method");
                (Operand::ScopedLocal(this_name), symbol)
            }
            node => panic!("Malformed CST! Node {:?} is not a primary atom", node),
        };

        let mut pending_receiver: Option<Operand> = None;
        for suffix in suffixes {
            match suffix {
                Suffix::Property { name, .. } => {
                    let property = self
                        .table
                        .get_property(&symbol.parent, name)
                        .expect("property exists after analysis")
                        .clone();
                    if property.kind == SymbolKind::Function {
                        // Static dispatch by name resolution up the chain;
                        // the atom becomes the method, the object becomes
                        // the receiver of the next call suffix.
                        pending_receiver = Some(operand.clone());
                        operand = Operand::Label(property.target_name());
                    } else {
                        self.emit(
                            QuadOp::Add,
                            operand,
                            Operand::Immediate(property.offset.to_string()),
                            Operand::AddressReg,
                        );
                        operand = if property.is_array() {
                            Operand::AddressReg
                        } else {
                            Operand::AddressRegDeref { byte: property.is_byte_sized() }
                        };
                    }
                    symbol = property;
                }
                Suffix::Index { expression, .. } => {
                    let (index_operand, _) = self.generate_expression(expression);
                    let index = Operand::StackTemp(String::from("t0"));
                    if index_operand != index {
                        self.emit(QuadOp::Assign, index_operand, Operand::None, index.clone());
                    }
                    if self.temp_count == 0 {
                        self.temp_count = 1;
                    }

                    // Bounds check against the outermost dimension.
                    let length = symbol.dimensions[0];
                    self.emit(
                        QuadOp::GreaterEqual,
                        index.clone(),
                        Operand::Immediate(length.to_string()),
                        Operand::Special(SpecialReg::Err),
                    );
                    self.emit(
                        QuadOp::IfErr,
                        Operand::Label(String::from("err_bad_index")),
                        Operand::None,
                        Operand::None,
                    );

                    // Scale by the remaining dimensions and the element
                    // width, then add onto the base address.
                    let remaining: usize = symbol.dimensions[1..].iter().product();
                    if remaining > 1 {
                        self.emit(
                            QuadOp::Mul,
                            index.clone(),
                            Operand::Immediate(remaining.to_string()),
                            index.clone(),
                        );
                    }
                    let scalar = symbol.scalar_element_size();
                    if scalar > 1 {
                        self.emit(
                            QuadOp::Mul,
                            index.clone(),
                            Operand::Immediate(scalar.to_string()),
                            index.clone(),
                        );
                    }
                    let base = match operand {
                        Operand::AddressReg | Operand::AddressRegDeref { .. } => {
                            Operand::AddressReg
                        }
                        other => other,
                    };
                    self.emit(QuadOp::Add, base, index, Operand::AddressReg);

                    let stripped = symbol.dimensions.remove(0);
                    if stripped > 0 {
                        symbol.size /= stripped;
                    }
                    operand = if symbol.is_array() {
                        Operand::AddressReg
                    } else {
                        Operand::AddressRegDeref { byte: symbol.is_byte_sized() }
                    };
                }
                Suffix::Call { arguments, .. } => {
                    // Calling a class atom constructs an instance.
                    if symbol.kind == SymbolKind::Class {
                        let class_name = symbol.name.clone();
                        let (object, instance) =
                            self.generate_class_construction(&class_name, arguments);
                        operand = object;
                        symbol = instance;
                        continue;
                    }

                    let mut argument_operands = Vec::new();
                    for argument in arguments {
                        argument_operands.push(self.generate_expression(argument).0);
                    }

                    for live in self.registry.clone() {
                        self.emit(QuadOp::Push, live, Operand::None, Operand::None);
                    }
                    for argument in argument_operands {
                        self.emit(QuadOp::Param, argument, Operand::None, Operand::None);
                    }
                    if let Some(receiver) = pending_receiver.take() {
                        self.emit(QuadOp::Param, receiver, Operand::None, Operand::None);
                    }
                    self.emit(QuadOp::Call, operand.clone(), Operand::None, Operand::None);
                    for live in self.registry.clone().into_iter().rev() {
                        self.emit(QuadOp::Pop, live, Operand::None, Operand::None);
                    }

                    operand = Operand::Special(SpecialReg::Ret);
                    let mut result =
                        Symbol::new(String::new(), SymbolKind::Variable, symbol.data_type);
                    result.parent = symbol.parent.clone();
                    result.dimensions = symbol.dimensions.clone();
                    result.size = symbol.data_type.scalar_size();
                    symbol = result;
                }
            }
        }

        (operand, symbol)
    }

    /// `new C(args)` allocates the instance storage and runs the resolved
    /// constructor with the fresh object as the first parameter.
    fn generate_new_expression(&mut self, class: &str, arguments: &[CstNode]) -> (Operand, Symbol) {
        self.generate_class_construction(class, arguments)
    }

    fn generate_class_construction(
        &mut self,
        class: &str,
        arguments: &[CstNode],
    ) -> (Operand, Symbol) {
        let class_symbol = self
            .table
            .lookup(class)
            .expect("class exists after analysis")
            .clone();

        let mut argument_operands = Vec::new();
        for argument in arguments {
            argument_operands.push(self.generate_expression(argument).0);
        }

        let object = self.next_temp();
        self.emit(
            QuadOp::Alloc,
            Operand::Immediate(class_symbol.size.to_string()),
            Operand::None,
            object.clone(),
        );

        let constructor_label = self
            .table
            .get_property(class, "constructor")
            .map(Symbol::target_name);
        if let Some(constructor_label) = constructor_label {
            self.emit(QuadOp::Param, object.clone(), Operand::None, Operand::None);
            for argument in argument_operands {
                self.emit(QuadOp::Param, argument, Operand::None, Operand::None);
            }
            self.emit(
                QuadOp::Call,
                Operand::Label(constructor_label),
                Operand::None,
                Operand::None,
            );
        }

        let mut symbol =
            Symbol::new(class.to_string(), SymbolKind::Variable, SymbolDataType::Object);
        symbol.parent = class_symbol.name;
        symbol.size = class_symbol.size;
        (object, symbol)
    }
}
