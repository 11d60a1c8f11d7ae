use super::super::ast::cst::{BinaryOp, CstNode, Parameter, Suffix, SwitchCase, TypeSpec, UnaryOp};
use super::super::ast::symbol::{Symbol, SymbolDataType, SymbolKind};
use super::super::ast::SymbolTable;
use super::context::Context;
use super::SemanticError;

/// Result of analysing one statement: the symbol a `return` statement hands
/// back to the enclosing function block, nothing otherwise.
type Analysis = Result<Option<Symbol>, SemanticError>;

/// CompiScriptSemanticAnalyser walks the CST in program order, building the
/// nested symbol table, enforcing the typing and scoping rules and
/// annotating declarations with layout data. The first error aborts the
/// walk.
pub struct CompiScriptSemanticAnalyser {
    table: SymbolTable,
    context: Context,
    /// Name of the enclosing function, for return-type checks.
    context_function: String,
    /// Running byte size of the class body under analysis.
    class_size: usize,
}

impl CompiScriptSemanticAnalyser {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            context: Context::empty(),
            context_function: String::new(),
            class_size: 0,
        }
    }

    /// Analyse a whole program, consuming the analyser and yielding the
    /// completed scope tree.
    pub fn analyse(mut self, root: &CstNode) -> Result<SymbolTable, SemanticError> {
        let statements = match root {
            CstNode::Program { statements } => statements,
            node => panic!("Malformed CST! Expected a program root, found {:?}", node),
        };
        for statement in statements {
            self.analyse_statement(statement)?;
        }
        Ok(self.table)
    }

    fn analyse_statement(&mut self, node: &CstNode) -> Analysis {
        match node {
            CstNode::Block { statements, .. } => {
                self.table.add_child_scope();
                self.analyse_block(statements)?;
                self.table.set_parent_as_current();
                Ok(None)
            }
            CstNode::VariableDeclaration { name, type_spec, initializer, line } => {
                self.analyse_declaration(
                    name,
                    type_spec.as_ref(),
                    initializer.as_deref(),
                    SymbolKind::Variable,
                    *line,
                )
            }
            CstNode::ConstantDeclaration { name, type_spec, initializer, line } => {
                self.analyse_declaration(
                    name,
                    type_spec.as_ref(),
                    Some(initializer.as_ref()),
                    SymbolKind::Constant,
                    *line,
                )
            }
            CstNode::Assignment { target, expression, line } => {
                self.analyse_assignment(target, expression, *line)
            }
            CstNode::ExpressionStatement { expression, .. } => {
                self.analyse_expression(expression)?;
                Ok(None)
            }
            CstNode::PrintStatement { expression, line } => {
                self.analyse_print_statement(expression, *line)
            }
            CstNode::IfStatement { condition, then_block, else_block, line } => {
                self.analyse_if_statement(condition, then_block, else_block.as_deref(), *line)
            }
            CstNode::WhileStatement { condition, body, line }
            | CstNode::DoWhileStatement { body, condition, line } => {
                self.analyse_while_statement(condition, body, *line)
            }
            CstNode::ForStatement { init, condition, advancement, body, line } => {
                self.analyse_for_statement(
                    init.as_deref(),
                    condition.as_deref(),
                    advancement.as_deref(),
                    body,
                    *line,
                )
            }
            CstNode::ForeachStatement { variable, iterable, body, line } => {
                self.analyse_foreach_statement(variable, iterable, body, *line)
            }
            CstNode::TryCatchStatement { try_block, variable, catch_block, .. } => {
                self.analyse_try_catch_statement(try_block, variable, catch_block)
            }
            CstNode::SwitchStatement { condition, cases, default, line } => {
                self.analyse_switch_statement(condition, cases, default.as_deref(), *line)
            }
            CstNode::BreakStatement { line } => self.analyse_loop_keyword("break", *line),
            CstNode::ContinueStatement { line } => self.analyse_loop_keyword("continue", *line),
            CstNode::ReturnStatement { expression, line } => {
                self.analyse_return_statement(expression.as_deref(), *line)
            }
            CstNode::FunctionDeclaration { name, parameters, return_type, body, line } => {
                self.analyse_function_declaration(
                    name,
                    parameters,
                    return_type.as_ref(),
                    body,
                    *line,
                )
            }
            CstNode::ClassDeclaration { name, parent, members, line } => {
                self.analyse_class_declaration(name, parent.as_deref(), members, *line)
            }
            expression => {
                self.analyse_expression(expression)?;
                Ok(None)
            }
        }
    }

    /// Analyse the statements of a block. Inside a function the iteration
    /// tracks a terminate flag: a return (or a break/continue inside a loop)
    /// makes every following statement unreachable, and the symbol of the
    /// first return is handed back for the missing-return check.
    fn analyse_block(&mut self, statements: &[CstNode]) -> Analysis {
        if !self.context.contains(Context::FUNCTION) {
            for statement in statements {
                self.analyse_statement(statement)?;
            }
            return Ok(None);
        }

        let mut symbol_return = None;
        let mut terminate = false;
        for statement in statements {
            if terminate {
                return Err(SemanticError::UnreachableCode { line: statement.line() });
            }
            let result = self.analyse_statement(statement)?;
            match statement {
                CstNode::ReturnStatement { .. } => {
                    symbol_return = result;
                    terminate = true;
                }
                CstNode::BreakStatement { .. } | CstNode::ContinueStatement { .. }
                    if self.context.in_loop() =>
                {
                    terminate = true;
                }
                _ => {}
            }
        }

        Ok(Some(symbol_return.unwrap_or_else(|| {
            Symbol::new(String::new(), SymbolKind::Literal, SymbolDataType::Nil)
        })))
    }

    /// Resolve a written type into a symbol carrying data type, class link
    /// and scalar size. Array annotations carry the dimension count only;
    /// the per-dimension lengths come from the initializer.
    fn resolve_type(&self, spec: &TypeSpec) -> Result<Symbol, SemanticError> {
        let data_type = SymbolDataType::parse(&spec.base);
        let mut symbol = Symbol::new(String::new(), SymbolKind::Variable, data_type);
        if data_type == SymbolDataType::Object {
            let class_symbol = self.table.lookup(&spec.base).cloned().ok_or_else(|| {
                SemanticError::UndefinedAccess { name: spec.base.clone(), line: spec.line }
            })?;
            if class_symbol.kind != SymbolKind::Class {
                return Err(SemanticError::InvalidType {
                    found: spec.base.clone(),
                    line: spec.line,
                });
            }
            symbol.parent = class_symbol.name;
            symbol.size = class_symbol.size;
        }
        symbol.dimensions = vec![0; spec.dimensions];
        Ok(symbol)
    }

    /// The type name used in mismatch diagnostics: the class name for
    /// objects, the data type otherwise.
    fn type_description(symbol: &Symbol) -> String {
        if symbol.data_type == SymbolDataType::Object && !symbol.parent.is_empty() {
            symbol.parent.clone()
        } else {
            symbol.data_type.to_string()
        }
    }

    fn analyse_declaration(
        &mut self,
        name: &str,
        type_spec: Option<&TypeSpec>,
        initializer: Option<&CstNode>,
        kind: SymbolKind,
        line: usize,
    ) -> Analysis {
        if self.table.lookup_local(name).is_some() {
            return Err(SemanticError::Redefinition { name: name.to_string(), line });
        }

        let mut symbol = Symbol::new(name.to_string(), kind, SymbolDataType::Undefined);
        symbol.size = 0;
        if let Some(spec) = type_spec {
            let declared = self.resolve_type(spec)?;
            symbol.data_type = declared.data_type;
            symbol.parent = declared.parent;
            symbol.dimensions = declared.dimensions;
            symbol.size = declared.size;
        }

        if let Some(expression) = initializer {
            let value = self.analyse_expression(expression)?;
            if symbol.data_type != SymbolDataType::Undefined {
                let compatible = symbol.data_type == value.data_type
                    && symbol.dimensions.len() == value.dimensions.len()
                    && symbol.parent == value.parent;
                if !compatible {
                    return Err(SemanticError::NonMatchingTypes {
                        expected: Self::type_description(&symbol),
                        found: Self::type_description(&value),
                        line,
                    });
                }
            }
            symbol.data_type = value.data_type;
            symbol.parent = value.parent;
            symbol.value = value.value;
            symbol.dimensions = value.dimensions;
            symbol.size = value.size;
        } else if symbol.data_type == SymbolDataType::Undefined {
            return Err(SemanticError::InvalidDeclaration { name: name.to_string(), line });
        }

        // Class-body declarations are layout slots of the class instance.
        if self.context.contains(Context::CLASS) && !self.context.contains(Context::FUNCTION) {
            if kind == SymbolKind::Variable {
                symbol.kind = SymbolKind::Property;
            }
            symbol.offset = self.class_size;
            self.class_size += symbol.size;
        }

        self.table.insert(symbol);
        Ok(None)
    }

    fn analyse_assignment(
        &mut self,
        target: &CstNode,
        expression: &CstNode,
        line: usize,
    ) -> Analysis {
        let (atom, suffixes) = match target {
            CstNode::LeftHandSide { atom, suffixes, .. } => (atom.as_ref(), suffixes.as_slice()),
            node => panic!("Malformed CST! Assignment target should be a left hand side, found {:?}", node),
        };

        match suffixes.last() {
            // Property form: everything in front of the final `.name` must
            // evaluate to an object holding that property.
            Some(Suffix::Property { name: property, .. }) => {
                let object =
                    self.analyse_left_hand_side(atom, &suffixes[..suffixes.len() - 1], line)?;
                if object.data_type != SymbolDataType::Object {
                    return Err(SemanticError::InvalidPropertyAccess {
                        property: property.clone(),
                        line,
                    });
                }
                let property_symbol = self
                    .table
                    .get_property(&object.parent, property)
                    .cloned()
                    .ok_or_else(|| SemanticError::InvalidPropertyAccess {
                        property: property.clone(),
                        line,
                    })?;
                if property_symbol.kind == SymbolKind::Constant {
                    return Err(SemanticError::ConstantModification {
                        name: property.clone(),
                        line,
                    });
                }
                let value = self.analyse_expression(expression)?;
                if property_symbol.data_type != value.data_type
                    || property_symbol.dimensions.len() != value.dimensions.len()
                {
                    return Err(SemanticError::NonMatchingTypes {
                        expected: Self::type_description(&property_symbol),
                        found: Self::type_description(&value),
                        line,
                    });
                }
                Ok(None)
            }
            _ => {
                let name = match atom {
                    CstNode::IdentifierExpr { name, .. } => name.clone(),
                    node => panic!("Malformed CST! Assignment target should be an identifier, found {:?}", node),
                };
                let mut symbol = self
                    .table
                    .lookup(&name)
                    .cloned()
                    .ok_or_else(|| SemanticError::UndefinedAccess { name: name.clone(), line })?;
                if symbol.kind == SymbolKind::Constant {
                    return Err(SemanticError::ConstantModification { name, line });
                }
                let value = self.analyse_expression(expression)?;
                let compatible = symbol.data_type == value.data_type
                    && symbol.dimensions.len() == value.dimensions.len()
                    && symbol.parent == value.parent;
                if !compatible {
                    return Err(SemanticError::NonMatchingTypes {
                        expected: Self::type_description(&symbol),
                        found: Self::type_description(&value),
                        line,
                    });
                }
                symbol.value = value.value;
                self.table.update(&name, symbol);
                Ok(None)
            }
        }
    }

    fn analyse_print_statement(&mut self, expression: &CstNode, line: usize) -> Analysis {
        let symbol = self.analyse_expression(expression)?;
        match symbol.data_type {
            SymbolDataType::Object | SymbolDataType::Nil | SymbolDataType::Undefined => {
                Err(SemanticError::InvalidType {
                    found: Self::type_description(&symbol),
                    line,
                })
            }
            _ => Ok(None),
        }
    }

    fn require_boolean_condition(&mut self, condition: &CstNode, line: usize) -> Analysis {
        let symbol = self.analyse_expression(condition)?;
        if symbol.data_type != SymbolDataType::Boolean {
            return Err(SemanticError::InvalidType {
                found: Self::type_description(&symbol),
                line,
            });
        }
        Ok(None)
    }

    fn block_statements<'a>(node: &'a CstNode) -> &'a [CstNode] {
        match node {
            CstNode::Block { statements, .. } => statements,
            node => panic!("Malformed CST! Expected a block, found {:?}", node),
        }
    }

    fn analyse_if_statement(
        &mut self,
        condition: &CstNode,
        then_block: &CstNode,
        else_block: Option<&CstNode>,
        line: usize,
    ) -> Analysis {
        self.require_boolean_condition(condition, line)?;

        self.table.add_child_scope();
        self.analyse_block(Self::block_statements(then_block))?;
        self.table.set_parent_as_current();

        if let Some(else_block) = else_block {
            self.table.add_child_scope();
            self.analyse_block(Self::block_statements(else_block))?;
            self.table.set_parent_as_current();
        }
        Ok(None)
    }

    fn analyse_while_statement(
        &mut self,
        condition: &CstNode,
        body: &CstNode,
        line: usize,
    ) -> Analysis {
        self.require_boolean_condition(condition, line)?;

        let freshly_set = self.context.enter(Context::WHILE);
        self.table.add_child_scope();
        let result = self.analyse_block(Self::block_statements(body));
        self.table.set_parent_as_current();
        self.context.exit(Context::WHILE, freshly_set);
        result?;
        Ok(None)
    }

    fn analyse_for_statement(
        &mut self,
        init: Option<&CstNode>,
        condition: Option<&CstNode>,
        advancement: Option<&CstNode>,
        body: &CstNode,
        line: usize,
    ) -> Analysis {
        let freshly_set = self.context.enter(Context::FOR);
        self.table.add_child_scope();

        let result = (|| -> Analysis {
            if let Some(init) = init {
                self.analyse_statement(init)?;
            }
            if let Some(condition) = condition {
                self.require_boolean_condition(condition, line)?;
            }
            if let Some(advancement) = advancement {
                self.analyse_statement(advancement)?;
            }
            self.analyse_block(Self::block_statements(body))?;
            Ok(None)
        })();

        self.table.set_parent_as_current();
        self.context.exit(Context::FOR, freshly_set);
        result
    }

    fn analyse_foreach_statement(
        &mut self,
        variable: &str,
        iterable: &CstNode,
        body: &CstNode,
        line: usize,
    ) -> Analysis {
        let iter_symbol = self.analyse_expression(iterable)?;
        if !iter_symbol.is_array() {
            return Err(SemanticError::InvalidType {
                found: Self::type_description(&iter_symbol),
                line,
            });
        }

        let mut element = Symbol::new(
            variable.to_string(),
            SymbolKind::Variable,
            iter_symbol.data_type,
        );
        element.parent = iter_symbol.parent.clone();
        element.dimensions = iter_symbol.dimensions[1..].to_vec();
        element.size = iter_symbol.element_stride();

        let freshly_set = self.context.enter(Context::FOR);
        self.table.add_child_scope();
        self.table.insert(element);
        let result = self.analyse_block(Self::block_statements(body));
        self.table.set_parent_as_current();
        self.context.exit(Context::FOR, freshly_set);
        result?;
        Ok(None)
    }

    fn analyse_try_catch_statement(
        &mut self,
        try_block: &CstNode,
        variable: &str,
        catch_block: &CstNode,
    ) -> Analysis {
        self.table.add_child_scope();
        self.analyse_block(Self::block_statements(try_block))?;
        self.table.set_parent_as_current();

        let caught = Symbol::new(
            variable.to_string(),
            SymbolKind::Constant,
            SymbolDataType::String,
        );
        self.table.add_child_scope();
        self.table.insert(caught);
        self.analyse_block(Self::block_statements(catch_block))?;
        self.table.set_parent_as_current();
        Ok(None)
    }

    fn analyse_switch_statement(
        &mut self,
        condition: &CstNode,
        cases: &[SwitchCase],
        default: Option<&[CstNode]>,
        line: usize,
    ) -> Analysis {
        let condition_symbol = self.analyse_expression(condition)?;
        if condition_symbol.data_type == SymbolDataType::Object {
            return Err(SemanticError::InvalidType {
                found: Self::type_description(&condition_symbol),
                line,
            });
        }

        for case in cases {
            let case_symbol = self.analyse_expression(&case.value)?;
            if case_symbol.kind != SymbolKind::Literal {
                return Err(SemanticError::InvalidType {
                    found: Self::type_description(&case_symbol),
                    line: case.line,
                });
            }
            if case_symbol.data_type != condition_symbol.data_type {
                return Err(SemanticError::NonMatchingTypes {
                    expected: Self::type_description(&condition_symbol),
                    found: Self::type_description(&case_symbol),
                    line: case.line,
                });
            }
            self.table.add_child_scope();
            self.analyse_block(&case.statements)?;
            self.table.set_parent_as_current();
        }

        if let Some(statements) = default {
            self.table.add_child_scope();
            self.analyse_block(statements)?;
            self.table.set_parent_as_current();
        }
        Ok(None)
    }

    fn analyse_loop_keyword(&mut self, keyword: &str, line: usize) -> Analysis {
        if !self.context.in_loop() {
            return Err(SemanticError::InvalidKeywordUse {
                keyword: keyword.to_string(),
                line,
            });
        }
        Ok(None)
    }

    fn analyse_return_statement(
        &mut self,
        expression: Option<&CstNode>,
        line: usize,
    ) -> Analysis {
        if !self.context.contains(Context::FUNCTION) {
            return Err(SemanticError::InvalidKeywordUse {
                keyword: String::from("return"),
                line,
            });
        }

        let Some(expression) = expression else {
            return Ok(Some(Symbol::new(
                String::new(),
                SymbolKind::Literal,
                SymbolDataType::Nil,
            )));
        };

        let function_symbol = self
            .table
            .lookup(&self.context_function)
            .cloned()
            .expect("enclosing function symbol exists while FUNCTION is set");
        let symbol_return = self.analyse_expression(expression)?;
        if function_symbol.data_type != SymbolDataType::Nil
            && (symbol_return.data_type != function_symbol.data_type
                || symbol_return.dimensions.len() != function_symbol.dimensions.len())
        {
            return Err(SemanticError::NonMatchingTypes {
                expected: Self::type_description(&function_symbol),
                found: Self::type_description(&symbol_return),
                line,
            });
        }
        Ok(Some(symbol_return))
    }

    fn analyse_function_declaration(
        &mut self,
        name: &str,
        parameters: &[Parameter],
        return_type: Option<&TypeSpec>,
        body: &CstNode,
        line: usize,
    ) -> Analysis {
        if self.table.lookup_local(name).is_some() {
            return Err(SemanticError::Redefinition { name: name.to_string(), line });
        }

        let mut symbol = Symbol::new(name.to_string(), SymbolKind::Function, SymbolDataType::Nil);
        symbol.size = 0;
        for parameter in parameters {
            let argument = match &parameter.type_spec {
                Some(spec) => {
                    let resolved = self.resolve_type(spec)?;
                    let mut argument = Symbol::new(
                        parameter.name.clone(),
                        SymbolKind::Argument,
                        resolved.data_type,
                    );
                    argument.parent = resolved.parent;
                    argument.dimensions = resolved.dimensions;
                    argument.size = resolved.size;
                    argument
                }
                None => Symbol::new(
                    parameter.name.clone(),
                    SymbolKind::Argument,
                    SymbolDataType::Undefined,
                ),
            };
            symbol.arg_list.push(argument);
        }
        if let Some(spec) = return_type {
            let resolved = self.resolve_type(spec)?;
            symbol.data_type = resolved.data_type;
            symbol.parent = resolved.parent;
            symbol.dimensions = resolved.dimensions;
        }
        self.table.insert(symbol.clone());

        // The body shares the scope holding the parameters.
        self.table.add_child_scope();
        for argument in &symbol.arg_list {
            self.table.insert(argument.clone());
        }

        let previous_function = std::mem::replace(&mut self.context_function, name.to_string());
        let freshly_set = self.context.enter(Context::FUNCTION);

        let result = self.analyse_block(Self::block_statements(body));

        let outcome = (|| -> Analysis {
            let symbol_return = result?.expect("function block always yields a return symbol");
            if symbol.data_type != SymbolDataType::Nil
                && symbol_return.data_type == SymbolDataType::Nil
            {
                return Err(SemanticError::MissingReturn {
                    function: name.to_string(),
                    expected: symbol.data_type.to_string(),
                    line,
                });
            }
            Ok(None)
        })();

        let mut defined = symbol;
        defined.definition = Some(self.table.current_scope());
        self.table.update(name, defined);

        self.context.exit(Context::FUNCTION, freshly_set);
        self.table.set_parent_as_current();
        self.context_function = previous_function;

        outcome
    }

    fn analyse_class_declaration(
        &mut self,
        name: &str,
        parent: Option<&str>,
        members: &[CstNode],
        line: usize,
    ) -> Analysis {
        if self.context.contains(Context::CLASS) {
            return Err(SemanticError::InvalidDeclaration { name: name.to_string(), line });
        }
        if self.table.lookup_local(name).is_some() {
            return Err(SemanticError::Redefinition { name: name.to_string(), line });
        }

        let mut symbol = Symbol::new(name.to_string(), SymbolKind::Class, SymbolDataType::Object);
        symbol.size = 0;
        let mut inherited_size = 0;
        if let Some(parent_name) = parent {
            let parent_symbol = self.table.lookup(parent_name).cloned().ok_or_else(|| {
                SemanticError::UndefinedAccess { name: parent_name.to_string(), line }
            })?;
            if parent_symbol.kind != SymbolKind::Class {
                return Err(SemanticError::InvalidType {
                    found: parent_name.to_string(),
                    line,
                });
            }
            symbol.parent = parent_symbol.name.clone();
            // Inheriting the constructor signature; a local constructor
            // overrides it below.
            symbol.arg_list = parent_symbol.arg_list.clone();
            inherited_size = parent_symbol.size;
        }
        self.table.insert(symbol.clone());

        self.table.add_child_scope();
        let freshly_set = self.context.enter(Context::CLASS);
        let previous_class_size = std::mem::replace(&mut self.class_size, inherited_size);

        symbol.definition = Some(self.table.current_scope());
        self.table.update(name, symbol.clone());

        let mut symbol_self =
            Symbol::new(String::from("this"), SymbolKind::Variable, SymbolDataType::Object);
        symbol_self.parent = name.to_string();
        self.table.insert(symbol_self);

        let result = (|| -> Analysis {
            for member in members {
                self.analyse_statement(member)?;
            }
            Ok(None)
        })();

        if let Some(constructor) = self.table.lookup_local("constructor") {
            symbol.arg_list = constructor.arg_list.clone();
        }
        symbol.size = self.class_size;
        symbol.definition = Some(self.table.current_scope());
        self.table.update(name, symbol);

        self.class_size = previous_class_size;
        self.context.exit(Context::CLASS, freshly_set);
        self.table.set_parent_as_current();

        result
    }

    fn analyse_expression(&mut self, node: &CstNode) -> Result<Symbol, SemanticError> {
        match node {
            CstNode::Literal { text, kind, .. } => Ok(Symbol::from_literal(text, *kind)),
            CstNode::ArrayLiteral { elements, line } => self.analyse_array_literal(elements, *line),
            CstNode::TernaryExpr { condition, true_branch, false_branch, line } => {
                self.analyse_ternary(condition, true_branch, false_branch, *line)
            }
            CstNode::BinaryExpr { op, lhs, rhs, line } => self.analyse_binary(*op, lhs, rhs, *line),
            CstNode::UnaryExpr { op, expression, line } => {
                self.analyse_unary(*op, expression, *line)
            }
            CstNode::LeftHandSide { atom, suffixes, line } => {
                self.analyse_left_hand_side(atom, suffixes, *line)
            }
            node => panic!("Malformed CST! Node {:?} is not an expression", node),
        }
    }

    /// Array literal typing: every element must share data type, size and
    /// dimensions with the first; the literal's dimensions are the element
    /// dimensions with the element count prepended, and its value is the
    /// semicolon-joined element values.
    fn analyse_array_literal(
        &mut self,
        elements: &[CstNode],
        line: usize,
    ) -> Result<Symbol, SemanticError> {
        let mut array_symbol =
            Symbol::new(String::new(), SymbolKind::Literal, SymbolDataType::Undefined);
        array_symbol.size = 0;

        let mut element_dimensions = Vec::new();
        let mut element_size = 0;
        let mut values = Vec::new();
        for (index, element) in elements.iter().enumerate() {
            let value_symbol = self.analyse_expression(element)?;
            if index == 0 {
                array_symbol.data_type = value_symbol.data_type;
                array_symbol.parent = value_symbol.parent.clone();
                element_dimensions = value_symbol.dimensions.clone();
                element_size = value_symbol.size;
            } else if value_symbol.data_type != array_symbol.data_type
                || value_symbol.dimensions != element_dimensions
                || value_symbol.size != element_size
            {
                return Err(SemanticError::NonMatchingTypes {
                    expected: Self::type_description(&array_symbol),
                    found: Self::type_description(&value_symbol),
                    line,
                });
            }
            array_symbol.size += value_symbol.size;
            values.push(value_symbol.value);
        }

        array_symbol.value = values.join(";");
        array_symbol.dimensions = std::iter::once(elements.len())
            .chain(element_dimensions)
            .collect();
        Ok(array_symbol)
    }

    fn analyse_ternary(
        &mut self,
        condition: &CstNode,
        true_branch: &CstNode,
        false_branch: &CstNode,
        line: usize,
    ) -> Result<Symbol, SemanticError> {
        self.require_boolean_condition(condition, line)?;
        let mut symbol_true = self.analyse_expression(true_branch)?;
        let symbol_false = self.analyse_expression(false_branch)?;
        if symbol_true.data_type != symbol_false.data_type {
            return Err(SemanticError::NonMatchingTypes {
                expected: Self::type_description(&symbol_true),
                found: Self::type_description(&symbol_false),
                line,
            });
        }
        symbol_true.kind = SymbolKind::Variable;
        symbol_true.value.clear();
        Ok(symbol_true)
    }

    fn analyse_binary(
        &mut self,
        op: BinaryOp,
        lhs: &CstNode,
        rhs: &CstNode,
        line: usize,
    ) -> Result<Symbol, SemanticError> {
        let symbol_lhs = self.analyse_expression(lhs)?;
        let symbol_rhs = self.analyse_expression(rhs)?;

        let require = |symbol: &Symbol, data_type: SymbolDataType| {
            if symbol.data_type != data_type || symbol.is_array() {
                Err(SemanticError::NonMatchingTypes {
                    expected: data_type.to_string(),
                    found: Self::type_description(symbol),
                    line,
                })
            } else {
                Ok(())
            }
        };

        let data_type = match op {
            BinaryOp::Add if symbol_lhs.data_type == SymbolDataType::String => {
                // String concatenation; a non-string right operand is
                // coerced during lowering.
                match symbol_rhs.data_type {
                    SymbolDataType::String
                    | SymbolDataType::Integer
                    | SymbolDataType::Boolean => SymbolDataType::String,
                    _ => {
                        return Err(SemanticError::NonMatchingTypes {
                            expected: SymbolDataType::String.to_string(),
                            found: Self::type_description(&symbol_rhs),
                            line,
                        })
                    }
                }
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                require(&symbol_lhs, SymbolDataType::Integer)?;
                require(&symbol_rhs, SymbolDataType::Integer)?;
                SymbolDataType::Integer
            }
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => {
                require(&symbol_lhs, SymbolDataType::Integer)?;
                require(&symbol_rhs, SymbolDataType::Integer)?;
                SymbolDataType::Boolean
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                if symbol_lhs.data_type != symbol_rhs.data_type {
                    return Err(SemanticError::NonMatchingTypes {
                        expected: Self::type_description(&symbol_lhs),
                        found: Self::type_description(&symbol_rhs),
                        line,
                    });
                }
                SymbolDataType::Boolean
            }
            BinaryOp::And | BinaryOp::Or => {
                require(&symbol_lhs, SymbolDataType::Boolean)?;
                require(&symbol_rhs, SymbolDataType::Boolean)?;
                SymbolDataType::Boolean
            }
        };

        Ok(Symbol::new(String::new(), SymbolKind::Variable, data_type))
    }

    fn analyse_unary(
        &mut self,
        op: UnaryOp,
        expression: &CstNode,
        line: usize,
    ) -> Result<Symbol, SemanticError> {
        let symbol = self.analyse_expression(expression)?;
        let required = match op {
            UnaryOp::Not => SymbolDataType::Boolean,
            UnaryOp::Negate => SymbolDataType::Integer,
        };
        if symbol.data_type != required || symbol.is_array() {
            return Err(SemanticError::NonMatchingTypes {
                expected: required.to_string(),
                found: Self::type_description(&symbol),
                line,
            });
        }
        let mut result = Symbol::new(String::new(), SymbolKind::Variable, required);
        result.value.clear();
        Ok(result)
    }

    /// A primary atom followed by its suffix chain: calls after functions,
    /// indexes after arrays, property accesses after objects. Any other
    /// combination is invalid.
    fn analyse_left_hand_side(
        &mut self,
        atom: &CstNode,
        suffixes: &[Suffix],
        line: usize,
    ) -> Result<Symbol, SemanticError> {
        let mut symbol = match atom {
            CstNode::IdentifierExpr { name, line } => self
                .table
                .lookup(name)
                .cloned()
                .ok_or_else(|| SemanticError::UndefinedAccess {
                    name: name.clone(),
                    line: *line,
                })?,
            CstNode::NewExpr { class, arguments, line } => {
                self.analyse_new_expression(class, arguments, *line)?
            }
            CstNode::ThisExpr { line } => self.table.lookup("this").cloned().ok_or(
                SemanticError::InvalidKeywordUse {
                    keyword: String::from("this"),
                    line: *line,
                },
            )?,
            node => panic!("Malformed CST! Node {:?} is not a primary atom", node),
        };

        if symbol.kind == SymbolKind::Function && suffixes.is_empty() {
            return Err(SemanticError::IncompleteCall { name: symbol.name, line });
        }

        for suffix in suffixes {
            match suffix {
                Suffix::Call { arguments, line } => {
                    if symbol.kind != SymbolKind::Function && symbol.kind != SymbolKind::Class {
                        return Err(SemanticError::InvalidSuffix { line: *line });
                    }
                    let mut argument_symbols = Vec::new();
                    for argument in arguments {
                        argument_symbols.push(self.analyse_expression(argument)?);
                    }
                    self.check_argument_list(&symbol.arg_list, &argument_symbols, *line)?;

                    // Calling a class runs its constructor and yields a
                    // fresh instance.
                    if symbol.kind == SymbolKind::Class {
                        let mut result = Symbol::new(
                            symbol.name.clone(),
                            SymbolKind::Variable,
                            SymbolDataType::Object,
                        );
                        result.parent = symbol.name.clone();
                        result.size = symbol.size;
                        symbol = result;
                        continue;
                    }

                    let mut result =
                        Symbol::new(String::new(), SymbolKind::Variable, symbol.data_type);
                    result.parent = symbol.parent.clone();
                    result.dimensions = symbol.dimensions.clone();
                    symbol = result;
                }
                Suffix::Index { expression, line } => {
                    if !symbol.is_array() {
                        return Err(SemanticError::InvalidSuffix { line: *line });
                    }
                    let index = self.analyse_expression(expression)?;
                    if index.data_type != SymbolDataType::Integer {
                        return Err(SemanticError::InvalidIndex { line: *line });
                    }
                    let length = symbol.dimensions.remove(0);
                    if length > 0 {
                        symbol.size /= length;
                    }
                    symbol.kind = SymbolKind::Variable;
                    symbol.value.clear();
                }
                Suffix::Property { name, line } => {
                    if symbol.data_type != SymbolDataType::Object || symbol.parent.is_empty() {
                        return Err(SemanticError::InvalidSuffix { line: *line });
                    }
                    symbol = self
                        .table
                        .get_property(&symbol.parent, name)
                        .cloned()
                        .ok_or_else(|| SemanticError::InvalidPropertyAccess {
                            property: name.clone(),
                            line: *line,
                        })?;
                }
            }
        }

        Ok(symbol)
    }

    fn analyse_new_expression(
        &mut self,
        class: &str,
        arguments: &[CstNode],
        line: usize,
    ) -> Result<Symbol, SemanticError> {
        let class_symbol = self
            .table
            .lookup(class)
            .cloned()
            .ok_or_else(|| SemanticError::UndefinedAccess { name: class.to_string(), line })?;
        if class_symbol.kind != SymbolKind::Class {
            return Err(SemanticError::InvalidType { found: class.to_string(), line });
        }

        let mut argument_symbols = Vec::new();
        for argument in arguments {
            argument_symbols.push(self.analyse_expression(argument)?);
        }
        self.check_argument_list(&class_symbol.arg_list, &argument_symbols, line)?;

        let mut symbol =
            Symbol::new(class.to_string(), SymbolKind::Variable, SymbolDataType::Object);
        symbol.parent = class_symbol.name;
        symbol.size = class_symbol.size;
        Ok(symbol)
    }

    fn check_argument_list(
        &self,
        expected: &[Symbol],
        received: &[Symbol],
        line: usize,
    ) -> Result<(), SemanticError> {
        if expected.len() != received.len() {
            return Err(SemanticError::NonMatchingArguments {
                expected: expected.len(),
                found: received.len(),
                line,
            });
        }
        for (parameter, argument) in expected.iter().zip(received.iter()) {
            if parameter.data_type != argument.data_type {
                return Err(SemanticError::NonMatchingTypes {
                    expected: Self::type_description(parameter),
                    found: Self::type_description(argument),
                    line,
                });
            }
        }
        Ok(())
    }
}

impl Default for CompiScriptSemanticAnalyser {
    fn default() -> Self {
        Self::new()
    }
}
