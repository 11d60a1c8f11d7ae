use crate::pest::Parser;

use super::super::ast::cst::{
    BinaryOp, CstNode, Parameter, Suffix, SwitchCase, TypeSpec, UnaryOp,
};
use super::super::ast::symbol::LiteralKind;
use super::AstParser;

/// CompiScriptParser parses a string into a series of tokens.
/// These tokens are defined as a Context-Free-Grammar in the
/// src/compiscript.pest file. The tokens generated from this parser are then
/// formalised into the CstNode tree consumed by the analyser and the IR
/// generator.
#[derive(Parser)]
#[grammar = "compiscript.pest"]
struct CompiScriptParser;

/// PestCompiScriptParser is a concrete AstParser. It uses the pest library to
/// generate a token sequence from a source string and converts that sequence
/// into a CstNode tree.
pub struct PestCompiScriptParser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;

fn line_of(pair: &Pair) -> usize {
    pair.as_span().start_pos().line_col().0
}

impl PestCompiScriptParser {
    /// Parses a source string into the root CstNode.
    fn parse_into_node_tree(&self, source: &str) -> Result<CstNode, String> {
        let mut pairs = CompiScriptParser::parse(Rule::program, source)
            .map_err(|error| format!("{}", error))?;

        let program = pairs.next().expect("program rule always present");
        let mut statements = Vec::new();
        for pair in program.into_inner() {
            if pair.as_rule() == Rule::EOI {
                continue;
            }
            statements.push(self.parse_pair_node(pair)?);
        }
        Ok(CstNode::Program { statements })
    }

    /// Parses a pest token pair into a CstNode.
    fn parse_pair_node(&self, pair: Pair) -> Result<CstNode, String> {
        match pair.as_rule() {
            Rule::variable_declaration => self.parse_pair_variable_declaration(pair),
            Rule::constant_declaration => self.parse_pair_constant_declaration(pair),
            Rule::assign_statement | Rule::for_advance => self.parse_pair_assignment(pair),
            Rule::expression_statement => self.parse_pair_expression_statement(pair),
            Rule::print_statement => self.parse_pair_print_statement(pair),
            Rule::block => self.parse_pair_block(pair),
            Rule::if_statement => self.parse_pair_if_statement(pair),
            Rule::while_statement => self.parse_pair_while_statement(pair),
            Rule::do_while_statement => self.parse_pair_do_while_statement(pair),
            Rule::for_statement => self.parse_pair_for_statement(pair),
            Rule::foreach_statement => self.parse_pair_foreach_statement(pair),
            Rule::try_catch_statement => self.parse_pair_try_catch_statement(pair),
            Rule::switch_statement => self.parse_pair_switch_statement(pair),
            Rule::break_statement => Ok(CstNode::BreakStatement { line: line_of(&pair) }),
            Rule::continue_statement => Ok(CstNode::ContinueStatement { line: line_of(&pair) }),
            Rule::return_statement => self.parse_pair_return_statement(pair),
            Rule::function_declaration => self.parse_pair_function_declaration(pair),
            Rule::class_declaration => self.parse_pair_class_declaration(pair),
            Rule::ternary_expr => self.parse_pair_ternary_expression(pair),
            Rule::logical_or_expr
            | Rule::logical_and_expr
            | Rule::equality_expr
            | Rule::relational_expr
            | Rule::additive_expr
            | Rule::multiplicative_expr => self.parse_pair_binary_expression(pair),
            Rule::unary_expr => self.parse_pair_unary_expression(pair),
            Rule::primary_expr => self.parse_pair_primary_expression(pair),
            Rule::literal_expr => self.parse_pair_literal_expression(pair),
            Rule::left_hand_side => self.parse_pair_left_hand_side(pair),
            rule => panic!("Whoops! Unprocessed pest rule: {:?}", rule),
        }
    }

    fn parse_pair_type_spec(&self, pair: Pair) -> TypeSpec {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let base = inner.next().expect("type base name").as_str().to_string();
        let dimensions = inner.filter(|p| p.as_rule() == Rule::array_suffix).count();
        TypeSpec { base, dimensions, line }
    }

    fn parse_pair_variable_declaration(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let name = inner.next().expect("declaration name").as_str().to_string();

        let mut type_spec = None;
        let mut initializer = None;
        for item in inner {
            match item.as_rule() {
                Rule::type_annotation => {
                    let spec = item.into_inner().next().expect("annotated type");
                    type_spec = Some(self.parse_pair_type_spec(spec));
                }
                Rule::initializer => {
                    let expression = item.into_inner().next().expect("initializer expression");
                    initializer = Some(Box::new(self.parse_pair_node(expression)?));
                }
                rule => panic!("Whoops! Unexpected declaration item: {:?}", rule),
            }
        }

        Ok(CstNode::VariableDeclaration { name, type_spec, initializer, line })
    }

    fn parse_pair_constant_declaration(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let name = inner.next().expect("declaration name").as_str().to_string();

        let mut type_spec = None;
        let mut initializer = None;
        for item in inner {
            match item.as_rule() {
                Rule::type_annotation => {
                    let spec = item.into_inner().next().expect("annotated type");
                    type_spec = Some(self.parse_pair_type_spec(spec));
                }
                Rule::initializer => {
                    let expression = item.into_inner().next().expect("initializer expression");
                    initializer = Some(Box::new(self.parse_pair_node(expression)?));
                }
                rule => panic!("Whoops! Unexpected declaration item: {:?}", rule),
            }
        }

        Ok(CstNode::ConstantDeclaration {
            name,
            type_spec,
            initializer: initializer.expect("constant initializer is required by the grammar"),
            line,
        })
    }

    fn parse_pair_assignment(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let rule = pair.as_rule();
        let mut inner = pair.into_inner();

        let target = if rule == Rule::for_advance {
            let name_pair = inner.next().expect("advance target");
            CstNode::LeftHandSide {
                line,
                atom: Box::new(CstNode::IdentifierExpr {
                    name: name_pair.as_str().to_string(),
                    line,
                }),
                suffixes: Vec::new(),
            }
        } else {
            self.parse_pair_node(inner.next().expect("assignment target"))?
        };

        // The grammar accepts any left-hand side in front of `=`; only a bare
        // identifier or a trailing property access is a valid target.
        if let CstNode::LeftHandSide { atom, suffixes, .. } = &target {
            let valid = match suffixes.last() {
                None => matches!(atom.as_ref(), CstNode::IdentifierExpr { .. }),
                Some(Suffix::Property { .. }) => true,
                Some(_) => false,
            };
            if !valid {
                return Err(format!("line {}: invalid assignment target", line));
            }
        } else {
            return Err(format!("line {}: invalid assignment target", line));
        }

        let expression = self.parse_pair_node(inner.next().expect("assigned expression"))?;
        Ok(CstNode::Assignment {
            target: Box::new(target),
            expression: Box::new(expression),
            line,
        })
    }

    fn parse_pair_expression_statement(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let expression = self.parse_pair_node(inner.next().expect("statement expression"))?;
        Ok(CstNode::ExpressionStatement { expression: Box::new(expression), line })
    }

    fn parse_pair_print_statement(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let expression = self.parse_pair_node(inner.next().expect("print expression"))?;
        Ok(CstNode::PrintStatement { expression: Box::new(expression), line })
    }

    fn parse_pair_block(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut statements = Vec::new();
        for statement in pair.into_inner() {
            statements.push(self.parse_pair_node(statement)?);
        }
        Ok(CstNode::Block { statements, line })
    }

    fn parse_pair_if_statement(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let condition = self.parse_pair_node(inner.next().expect("if condition"))?;
        let then_block = self.parse_pair_node(inner.next().expect("if block"))?;
        let else_block = match inner.next() {
            Some(block) => Some(Box::new(self.parse_pair_node(block)?)),
            None => None,
        };
        Ok(CstNode::IfStatement {
            condition: Box::new(condition),
            then_block: Box::new(then_block),
            else_block,
            line,
        })
    }

    fn parse_pair_while_statement(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let condition = self.parse_pair_node(inner.next().expect("while condition"))?;
        let body = self.parse_pair_node(inner.next().expect("while block"))?;
        Ok(CstNode::WhileStatement {
            condition: Box::new(condition),
            body: Box::new(body),
            line,
        })
    }

    fn parse_pair_do_while_statement(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let body = self.parse_pair_node(inner.next().expect("do block"))?;
        let condition = self.parse_pair_node(inner.next().expect("do condition"))?;
        Ok(CstNode::DoWhileStatement {
            body: Box::new(body),
            condition: Box::new(condition),
            line,
        })
    }

    fn parse_pair_for_statement(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut init = None;
        let mut condition = None;
        let mut advancement = None;
        let mut body = None;
        for item in pair.into_inner() {
            match item.as_rule() {
                Rule::variable_declaration => {
                    init = Some(Box::new(self.parse_pair_node(item)?));
                }
                Rule::for_condition => {
                    let expression = item.into_inner().next().expect("for condition");
                    condition = Some(Box::new(self.parse_pair_node(expression)?));
                }
                Rule::for_advance => {
                    advancement = Some(Box::new(self.parse_pair_node(item)?));
                }
                Rule::block => {
                    body = Some(Box::new(self.parse_pair_node(item)?));
                }
                rule => panic!("Whoops! Unexpected for item: {:?}", rule),
            }
        }
        Ok(CstNode::ForStatement {
            init,
            condition,
            advancement,
            body: body.expect("for block is required by the grammar"),
            line,
        })
    }

    fn parse_pair_foreach_statement(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let variable = inner.next().expect("foreach variable").as_str().to_string();
        let iterable = self.parse_pair_node(inner.next().expect("foreach iterable"))?;
        let body = self.parse_pair_node(inner.next().expect("foreach block"))?;
        Ok(CstNode::ForeachStatement {
            variable,
            iterable: Box::new(iterable),
            body: Box::new(body),
            line,
        })
    }

    fn parse_pair_try_catch_statement(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let try_block = self.parse_pair_node(inner.next().expect("try block"))?;
        let variable = inner.next().expect("catch variable").as_str().to_string();
        let catch_block = self.parse_pair_node(inner.next().expect("catch block"))?;
        Ok(CstNode::TryCatchStatement {
            try_block: Box::new(try_block),
            variable,
            catch_block: Box::new(catch_block),
            line,
        })
    }

    fn parse_pair_switch_statement(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let condition = self.parse_pair_node(inner.next().expect("switch condition"))?;

        let mut cases = Vec::new();
        let mut default = None;
        for item in inner {
            match item.as_rule() {
                Rule::switch_case => {
                    let case_line = line_of(&item);
                    let mut case_inner = item.into_inner();
                    let value = self.parse_pair_node(case_inner.next().expect("case value"))?;
                    let mut statements = Vec::new();
                    for statement in case_inner {
                        statements.push(self.parse_pair_node(statement)?);
                    }
                    cases.push(SwitchCase { value, statements, line: case_line });
                }
                Rule::default_case => {
                    let mut statements = Vec::new();
                    for statement in item.into_inner() {
                        statements.push(self.parse_pair_node(statement)?);
                    }
                    default = Some(statements);
                }
                rule => panic!("Whoops! Unexpected switch item: {:?}", rule),
            }
        }

        Ok(CstNode::SwitchStatement {
            condition: Box::new(condition),
            cases,
            default,
            line,
        })
    }

    fn parse_pair_return_statement(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let expression = match inner.next() {
            Some(expression) => Some(Box::new(self.parse_pair_node(expression)?)),
            None => None,
        };
        Ok(CstNode::ReturnStatement { expression, line })
    }

    fn parse_pair_function_declaration(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let name = inner.next().expect("function name").as_str().to_string();

        let mut parameters = Vec::new();
        let mut return_type = None;
        let mut body = None;
        for item in inner {
            match item.as_rule() {
                Rule::parameters => {
                    for parameter in item.into_inner() {
                        let parameter_line = line_of(&parameter);
                        let mut parameter_inner = parameter.into_inner();
                        let parameter_name =
                            parameter_inner.next().expect("parameter name").as_str().to_string();
                        let type_spec = parameter_inner
                            .next()
                            .map(|spec| self.parse_pair_type_spec(spec));
                        parameters.push(Parameter {
                            name: parameter_name,
                            type_spec,
                            line: parameter_line,
                        });
                    }
                }
                Rule::type_spec => {
                    return_type = Some(self.parse_pair_type_spec(item));
                }
                Rule::block => {
                    body = Some(Box::new(self.parse_pair_node(item)?));
                }
                rule => panic!("Whoops! Unexpected function item: {:?}", rule),
            }
        }

        Ok(CstNode::FunctionDeclaration {
            name,
            parameters,
            return_type,
            body: body.expect("function block is required by the grammar"),
            line,
        })
    }

    fn parse_pair_class_declaration(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let name = inner.next().expect("class name").as_str().to_string();

        let mut parent = None;
        let mut members = Vec::new();
        for item in inner {
            match item.as_rule() {
                Rule::identifier => parent = Some(item.as_str().to_string()),
                _ => members.push(self.parse_pair_node(item)?),
            }
        }

        Ok(CstNode::ClassDeclaration { name, parent, members, line })
    }

    fn parse_pair_ternary_expression(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let condition = self.parse_pair_node(inner.next().expect("ternary condition"))?;
        match inner.next() {
            Some(true_pair) => {
                let true_branch = self.parse_pair_node(true_pair)?;
                let false_branch =
                    self.parse_pair_node(inner.next().expect("ternary false branch"))?;
                Ok(CstNode::TernaryExpr {
                    condition: Box::new(condition),
                    true_branch: Box::new(true_branch),
                    false_branch: Box::new(false_branch),
                    line,
                })
            }
            None => Ok(condition),
        }
    }

    /// Folds a linear list of binary operations of equal precedence into a
    /// left-associative tree of BinaryExpr nodes.
    fn parse_pair_binary_expression(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();

        let mut lhs = self.parse_pair_node(inner.next().expect("binary operand"))?;
        while inner.peek().is_some() {
            let op = Self::binary_op_from(inner.next().expect("binary operator").as_str());
            let rhs = self.parse_pair_node(inner.next().expect("binary operand"))?;
            lhs = CstNode::BinaryExpr {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_pair_unary_expression(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let first = inner.next().expect("unary operand");
        if first.as_rule() == Rule::unary_op {
            let op = match first.as_str() {
                "!" => UnaryOp::Not,
                "-" => UnaryOp::Negate,
                text => panic!("Whoops! Unprocessed unary operator: {}", text),
            };
            let expression = self.parse_pair_node(inner.next().expect("unary operand"))?;
            Ok(CstNode::UnaryExpr { op, expression: Box::new(expression), line })
        } else {
            self.parse_pair_node(first)
        }
    }

    fn parse_pair_primary_expression(&self, pair: Pair) -> Result<CstNode, String> {
        let mut inner = pair.into_inner();
        self.parse_pair_node(inner.next().expect("primary expression"))
    }

    fn parse_pair_literal_expression(&self, pair: Pair) -> Result<CstNode, String> {
        let mut inner = pair.into_inner();
        let literal = inner.next().expect("literal token");
        let line = line_of(&literal);
        match literal.as_rule() {
            Rule::array_literal => {
                let mut elements = Vec::new();
                for element in literal.into_inner() {
                    elements.push(self.parse_pair_node(element)?);
                }
                Ok(CstNode::ArrayLiteral { elements, line })
            }
            Rule::integer => Ok(CstNode::Literal {
                text: literal.as_str().to_string(),
                kind: LiteralKind::Integer,
                line,
            }),
            Rule::string => Ok(CstNode::Literal {
                text: literal.as_str().to_string(),
                kind: LiteralKind::String,
                line,
            }),
            Rule::boolean => Ok(CstNode::Literal {
                text: literal.as_str().to_string(),
                kind: LiteralKind::Boolean,
                line,
            }),
            Rule::null_lit => Ok(CstNode::Literal {
                text: literal.as_str().to_string(),
                kind: LiteralKind::Null,
                line,
            }),
            rule => panic!("Whoops! Unprocessed literal rule: {:?}", rule),
        }
    }

    fn parse_pair_left_hand_side(&self, pair: Pair) -> Result<CstNode, String> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let atom_pair = inner.next().expect("primary atom");
        let atom = match atom_pair.as_rule() {
            Rule::identifier_expr => {
                let identifier = atom_pair.into_inner().next().expect("identifier");
                CstNode::IdentifierExpr {
                    name: identifier.as_str().to_string(),
                    line: line_of(&identifier),
                }
            }
            Rule::new_expr => {
                let new_line = line_of(&atom_pair);
                let mut new_inner = atom_pair.into_inner();
                let class = new_inner.next().expect("class name").as_str().to_string();
                let mut arguments = Vec::new();
                if let Some(argument_list) = new_inner.next() {
                    for argument in argument_list.into_inner() {
                        arguments.push(self.parse_pair_node(argument)?);
                    }
                }
                CstNode::NewExpr { class, arguments, line: new_line }
            }
            Rule::this_expr => CstNode::ThisExpr { line: line_of(&atom_pair) },
            rule => panic!("Whoops! Unprocessed primary atom: {:?}", rule),
        };

        let mut suffixes = Vec::new();
        for suffix in inner {
            let suffix_line = line_of(&suffix);
            match suffix.as_rule() {
                Rule::call_suffix => {
                    let mut arguments = Vec::new();
                    if let Some(argument_list) = suffix.into_inner().next() {
                        for argument in argument_list.into_inner() {
                            arguments.push(self.parse_pair_node(argument)?);
                        }
                    }
                    suffixes.push(Suffix::Call { arguments, line: suffix_line });
                }
                Rule::index_suffix => {
                    let expression = suffix.into_inner().next().expect("index expression");
                    suffixes.push(Suffix::Index {
                        expression: Box::new(self.parse_pair_node(expression)?),
                        line: suffix_line,
                    });
                }
                Rule::property_suffix => {
                    let name = suffix.into_inner().next().expect("property name");
                    suffixes.push(Suffix::Property {
                        name: name.as_str().to_string(),
                        line: suffix_line,
                    });
                }
                rule => panic!("Whoops! Unprocessed suffix: {:?}", rule),
            }
        }

        Ok(CstNode::LeftHandSide { atom: Box::new(atom), suffixes, line })
    }

    fn binary_op_from(text: &str) -> BinaryOp {
        match text {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "<" => BinaryOp::Less,
            ">" => BinaryOp::Greater,
            "<=" => BinaryOp::LessEqual,
            ">=" => BinaryOp::GreaterEqual,
            "==" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            text => panic!("Whoops! Unprocessed binary operator: {}", text),
        }
    }
}

/// AstParser Trait Concrete Implementation
impl AstParser for PestCompiScriptParser {
    /// PestCompiScriptParser has no configuration, the default is just
    /// instantiation.
    fn default() -> Self {
        Self
    }

    /// Parse processes a source string into a concrete syntax tree.
    fn parse(self, source: &str) -> Result<CstNode, String> {
        self.parse_into_node_tree(source)
    }
}
