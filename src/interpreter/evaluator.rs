use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use super::builtins;
use super::environment::{Env, Environment};
use crate::ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::value::{FunctionValue, HashPair, HashValue, Value};

/// One script run: walks the AST against an environment chain and owns
/// the konst registry. Constants are script-wide; they cannot be
/// shadowed or rebound in any nested scope.
pub struct Script {
    konst: HashSet<Rc<str>>,
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl Script {
    pub fn new() -> Self {
        Self {
            konst: HashSet::new(),
        }
    }

    /// Discards the konst registry. Environments referenced by live
    /// closures are reclaimed normally.
    pub fn free(&mut self) {
        self.konst.clear();
    }

    /// Evaluates statements in order. `pilih` unwinds here (its value is
    /// unwrapped), errors short-circuit; the last expression's value is
    /// the program's value.
    pub fn eval_program(&mut self, program: &Program, env: &Env) -> Value {
        let mut result = Value::Null;
        for stmt in &program.statements {
            match self.eval_stmt(stmt, env) {
                Value::Return(value) => return *value,
                err @ Value::Error(_) => return err,
                value => result = value,
            }
        }
        result
    }

    fn eval_stmt(&mut self, stmt: &Stmt, env: &Env) -> Value {
        match stmt {
            Stmt::Var { name, value } => self.bind_var(name, value, env),
            Stmt::Konst { name, value } => self.bind_konst(name, value, env),
            Stmt::Pilih(value) => {
                let value = self.eval_expr(value, env);
                if value.is_error() {
                    return value;
                }
                Value::Return(Box::new(value))
            }
            Stmt::Expr(expr) => self.eval_expr(expr, env),
        }
    }

    /// Unlike the program, a block hands `Return` and `Error` back
    /// unconsumed so enclosing frames can unwind; `Break`/`Continue`
    /// likewise travel up to the nearest loop.
    fn eval_block(&mut self, block: &Block, env: &Env) -> Value {
        let mut result = Value::Null;
        for stmt in &block.statements {
            result = self.eval_stmt(stmt, env);
            if matches!(
                result,
                Value::Return(_) | Value::Error(_) | Value::Break | Value::Continue
            ) {
                return result;
            }
        }
        result
    }

    /// Shared binding path for `var name = expr` and the expression form
    /// `name = expr`: konst check, then type-change check against any
    /// existing binding in the chain, then a write to the current frame.
    fn bind_var(&mut self, name: &Rc<str>, value: &Expr, env: &Env) -> Value {
        let value = self.eval_expr(value, env);
        if value.is_error() {
            return value;
        }
        if self.konst.contains(name) {
            return Value::Error(format!(
                "konstanta {} tidak bisa ditugaskan kembali",
                name
            ));
        }
        if let Some(existing) = env.get(name) {
            let (from, to) = (existing.type_name(), value.type_name());
            if from != to {
                return Value::Error(format!(
                    "perubahan tipe variabel {} dari {} menjadi {} tidak diizinkan",
                    name, from, to
                ));
            }
        }
        env.set(Rc::clone(name), value);
        Value::Null
    }

    fn bind_konst(&mut self, name: &Rc<str>, value: &Expr, env: &Env) -> Value {
        let value = self.eval_expr(value, env);
        if value.is_error() {
            return value;
        }
        if self.konst.contains(name) {
            return Value::Error(format!(
                "konstanta {} tidak bisa ditugaskan kembali",
                name
            ));
        }
        env.set(Rc::clone(name), value);
        self.konst.insert(Rc::clone(name));
        Value::Null
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Env) -> Value {
        match expr {
            Expr::Int(n) => Value::Integer(*n),
            Expr::Bool(b) => Value::Boolean(*b),
            Expr::Str(s) => Value::Str(Rc::clone(s)),
            Expr::Nihil => Value::Null,
            // Regex literals have no runtime representation in the core
            // value set; they only matter to pattern-consuming hosts.
            Expr::Regex(_) => Value::Null,
            Expr::Wildcard => Value::Null,
            Expr::Ident(name) => eval_identifier(name, env),
            Expr::Assign { name, value } => self.bind_var(name, value, env),
            Expr::Prefix { op, right } => {
                let right = self.eval_expr(right, env);
                if right.is_error() {
                    return right;
                }
                eval_prefix_expression(*op, right)
            }
            Expr::Infix { left, op, right } => {
                let left = self.eval_expr(left, env);
                if left.is_error() {
                    return left;
                }
                let right = self.eval_expr(right, env);
                if right.is_error() {
                    return right;
                }
                eval_infix_expression(*op, &left, &right)
            }
            Expr::Jika {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expr(condition, env);
                if condition.is_error() {
                    return condition;
                }
                if condition.is_truthy() {
                    self.eval_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.eval_block(alternative, env)
                } else {
                    Value::Null
                }
            }
            Expr::Pilah {
                target,
                conditions,
                values,
            } => self.eval_pilah(target, conditions, values, env),
            Expr::Function { params, body } => Value::Function(Rc::new(FunctionValue {
                params: params.clone(),
                body: body.clone(),
                env: Rc::clone(env),
            })),
            Expr::Call { function, args } => {
                let callee = self.eval_expr(function, env);
                if callee.is_error() {
                    return callee;
                }
                let args = match self.eval_expressions(args, env) {
                    Ok(args) => args,
                    Err(err) => return err,
                };
                self.apply_function(callee, args)
            }
            Expr::Array(elements) => match self.eval_expressions(elements, env) {
                Ok(elements) => Value::Array(Rc::new(elements)),
                Err(err) => err,
            },
            Expr::Hash(pairs) => self.eval_hash_literal(pairs, env),
            Expr::Index { left, index } => {
                let left = self.eval_expr(left, env);
                if left.is_error() {
                    return left;
                }
                let index = self.eval_expr(index, env);
                if index.is_error() {
                    return index;
                }
                eval_index_expression(&left, &index)
            }
            Expr::MethodCall { object, call } => self.eval_method_call(object, call, env),
            Expr::Pipe { left, right } => self.eval_pipe(left, right, env),
            Expr::Loop { kv, iter, body } => self.eval_loop(kv, iter, body, env),
            Expr::Break => Value::Break,
            Expr::Continue => Value::Continue,
        }
    }

    fn eval_expressions(&mut self, exprs: &[Expr], env: &Env) -> Result<Vec<Value>, Value> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let value = self.eval_expr(expr, env);
            if value.is_error() {
                return Err(value);
            }
            values.push(value);
        }
        Ok(values)
    }

    /// First match wins; a wildcard pattern wins wherever it appears.
    /// With no target the patterns compare against `nihil`.
    fn eval_pilah(
        &mut self,
        target: &Option<Box<Expr>>,
        conditions: &[Expr],
        values: &[Expr],
        env: &Env,
    ) -> Value {
        let target = match target {
            Some(target) => {
                let value = self.eval_expr(target, env);
                if value.is_error() {
                    return value;
                }
                value
            }
            None => Value::Null,
        };
        for (condition, value) in conditions.iter().zip(values.iter()) {
            if matches!(condition, Expr::Wildcard) {
                return self.eval_expr(value, env);
            }
            let condition = self.eval_expr(condition, env);
            if condition.is_error() {
                return condition;
            }
            if eval_infix_expression(InfixOp::Eq, &target, &condition).is_truthy() {
                return self.eval_expr(value, env);
            }
        }
        Value::Null
    }

    fn apply_function(&mut self, callee: Value, args: Vec<Value>) -> Value {
        match callee {
            Value::Function(function) => {
                if function.params.len() != args.len() {
                    return Value::Error(format!(
                        "invalid length between function parameter={} & args={}",
                        function.params.len(),
                        args.len()
                    ));
                }
                let env = Environment::enclosed(Rc::clone(&function.env));
                for (param, arg) in function.params.iter().zip(args) {
                    env.set(Rc::clone(param), arg);
                }
                match self.eval_block(&function.body, &env) {
                    Value::Return(value) => *value,
                    other => other,
                }
            }
            Value::Builtin(builtin) => (builtin.func)(&args),
            other => Value::Error(format!("not a function: {}", other.type_name())),
        }
    }

    fn eval_hash_literal(&mut self, pairs: &[(Expr, Expr)], env: &Env) -> Value {
        let mut map = IndexMap::new();
        for (key_expr, value_expr) in pairs {
            let key = self.eval_expr(key_expr, env);
            if key.is_error() {
                return key;
            }
            let hash_key = match key.hash_key() {
                Some(hash_key) => hash_key,
                None => {
                    return Value::Error(format!("unusable as hash key: {}", key.type_name()));
                }
            };
            let value = self.eval_expr(value_expr, env);
            if value.is_error() {
                return value;
            }
            map.insert(hash_key, HashPair { key, value });
        }
        Value::Hash(Rc::new(HashValue { pairs: map }))
    }

    /// `obj.name(args…)` resolves `obj.name` in the namespaced builtin
    /// table; there are no value-attached methods.
    fn eval_method_call(&mut self, object: &Expr, call: &Expr, env: &Env) -> Value {
        let (name, args): (&Expr, &[Expr]) = match call {
            Expr::Call { function, args } => (function.as_ref(), args.as_slice()),
            bare => (bare, &[]),
        };
        let method = match name {
            Expr::Ident(name) => name,
            other => {
                return Value::Error(format!("not a function: {}", other));
            }
        };
        let qualified = format!("{}.{}", object, method);
        match builtins::lookup(&qualified) {
            Some(builtin) => {
                let args = match self.eval_expressions(args, env) {
                    Ok(args) => args,
                    Err(err) => return err,
                };
                self.apply_function(builtin, args)
            }
            None => Value::Error(format!("identifier not found: {}", qualified)),
        }
    }

    /// `L |> R`: the left value is rematerialized as a literal argument
    /// expression, then dispatched on the shape of R. This keeps one
    /// path whether R is an unapplied function name or an existing call.
    fn eval_pipe(&mut self, left: &Expr, right: &Expr, env: &Env) -> Value {
        let piped = self.eval_expr(left, env);
        if piped.is_error() {
            return piped;
        }
        let argument = match value_to_expr(&piped) {
            Some(argument) => argument,
            None => return Value::Null,
        };

        match right {
            Expr::MethodCall { object, call } => {
                let call = match call.as_ref() {
                    Expr::Call { function, args } => {
                        let mut prepended = Vec::with_capacity(args.len() + 1);
                        prepended.push(argument);
                        prepended.extend(args.iter().cloned());
                        Expr::Call {
                            function: function.clone(),
                            args: prepended,
                        }
                    }
                    // A bare method name becomes a zero-argument call
                    // before the receiver is prepended.
                    bare @ Expr::Ident(_) => Expr::Call {
                        function: Box::new(bare.clone()),
                        args: vec![argument],
                    },
                    other => {
                        eprintln!("unhandled pipe {}", other);
                        return Value::Null;
                    }
                };
                self.eval_method_call(object, &call, env)
            }
            Expr::Call { function, args } => {
                let mut prepended = Vec::with_capacity(args.len() + 1);
                prepended.push(argument);
                prepended.extend(args.iter().cloned());
                let call = Expr::Call {
                    function: function.clone(),
                    args: prepended,
                };
                self.eval_expr(&call, env)
            }
            Expr::Ident(_) | Expr::Function { .. } => {
                let callee = self.eval_expr(right, env);
                if callee.is_error() {
                    return callee;
                }
                let argument = self.eval_expr(&argument, env);
                if argument.is_error() {
                    return argument;
                }
                self.apply_function(callee, vec![argument])
            }
            other => {
                eprintln!("unhandled pipe {}", other);
                Value::Null
            }
        }
    }

    /// `tiap k[,v] di xs { body }` over strings (scalar index → one-code-
    /// point string), arrays (index → element) and hashes (key → value).
    fn eval_loop(&mut self, kv: &[Rc<str>], iter: &Rc<str>, body: &Block, env: &Env) -> Value {
        let iterable = eval_identifier(iter, env);
        if iterable.is_error() {
            return iterable;
        }
        if !iterable.is_iterable() {
            return Value::Error(format!("identifier {} is not iterable", iter));
        }
        let entries: Vec<(Value, Value)> = match &iterable {
            Value::Str(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| {
                    (
                        Value::Integer(i as i64),
                        Value::Str(Rc::from(c.to_string().as_str())),
                    )
                })
                .collect(),
            Value::Array(elements) => elements
                .iter()
                .enumerate()
                .map(|(i, element)| (Value::Integer(i as i64), element.clone()))
                .collect(),
            Value::Hash(hash) => hash
                .pairs
                .values()
                .map(|pair| (pair.key.clone(), pair.value.clone()))
                .collect(),
            _ => unreachable!("is_iterable admits only strings, arrays and hashes"),
        };

        for (key, value) in entries {
            let frame = Environment::enclosed(Rc::clone(env));
            frame.set(Rc::clone(&kv[0]), key);
            if let Some(second) = kv.get(1) {
                frame.set(Rc::clone(second), value);
            }
            match self.eval_block(body, &frame) {
                Value::Break => break,
                Value::Continue => continue,
                err @ Value::Error(_) => return err,
                ret @ Value::Return(_) => return ret,
                _ => {}
            }
        }
        Value::Null
    }
}

fn eval_identifier(name: &str, env: &Env) -> Value {
    if let Some(builtin) = builtins::lookup(name) {
        return builtin;
    }
    match env.get(name) {
        Some(value) => value,
        None => Value::Error(format!("identifier not found: {}", name)),
    }
}

fn eval_prefix_expression(op: PrefixOp, right: Value) -> Value {
    match op {
        PrefixOp::Bang => match right {
            Value::Boolean(true) => Value::Boolean(false),
            Value::Boolean(false) => Value::Boolean(true),
            Value::Null => Value::Boolean(true),
            _ => Value::Boolean(false),
        },
        PrefixOp::Minus => match right {
            Value::Integer(n) => Value::Integer(-n),
            other => Value::Error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn eval_infix_expression(op: InfixOp, left: &Value, right: &Value) -> Value {
    if left.type_name() != right.type_name() {
        return Value::Error(format!(
            "type mismatch: {} {} {}",
            left.type_name(),
            op,
            right.type_name()
        ));
    }
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => eval_integer_infix(op, *l, *r),
        (Value::Str(l), Value::Str(r)) => eval_string_infix(op, l, r),
        (Value::Boolean(l), Value::Boolean(r)) => eval_boolean_infix(op, *l, *r),
        _ => unknown_operator(op, left, right),
    }
}

fn eval_integer_infix(op: InfixOp, left: i64, right: i64) -> Value {
    match op {
        InfixOp::Plus => Value::Integer(left + right),
        InfixOp::Minus => Value::Integer(left - right),
        InfixOp::Asterisk => Value::Integer(left * right),
        InfixOp::Slash => match left.checked_div(right) {
            Some(quotient) => Value::Integer(quotient),
            None => Value::Error("division by zero".to_string()),
        },
        InfixOp::Mod => match left.checked_rem(right) {
            Some(remainder) => Value::Integer(remainder),
            None => Value::Error("division by zero".to_string()),
        },
        InfixOp::Lt => Value::Boolean(left < right),
        InfixOp::Gt => Value::Boolean(left > right),
        InfixOp::Lte => Value::Boolean(left <= right),
        InfixOp::Gte => Value::Boolean(left >= right),
        InfixOp::Eq => Value::Boolean(left == right),
        InfixOp::NotEq => Value::Boolean(left != right),
        InfixOp::And | InfixOp::Or => {
            unknown_operator(op, &Value::Integer(left), &Value::Integer(right))
        }
    }
}

fn eval_string_infix(op: InfixOp, left: &Rc<str>, right: &Rc<str>) -> Value {
    match op {
        InfixOp::Plus => {
            let mut joined = String::with_capacity(left.len() + right.len());
            joined.push_str(left);
            joined.push_str(right);
            Value::Str(Rc::from(joined.as_str()))
        }
        InfixOp::Eq => Value::Boolean(left == right),
        _ => unknown_operator(
            op,
            &Value::Str(Rc::clone(left)),
            &Value::Str(Rc::clone(right)),
        ),
    }
}

fn eval_boolean_infix(op: InfixOp, left: bool, right: bool) -> Value {
    match op {
        InfixOp::And => Value::Boolean(left && right),
        InfixOp::Or => Value::Boolean(left || right),
        InfixOp::Eq => Value::Boolean(left == right),
        InfixOp::NotEq => Value::Boolean(left != right),
        _ => unknown_operator(op, &Value::Boolean(left), &Value::Boolean(right)),
    }
}

fn unknown_operator(op: InfixOp, left: &Value, right: &Value) -> Value {
    Value::Error(format!(
        "unknown operator: {} {} {}",
        left.type_name(),
        op,
        right.type_name()
    ))
}

fn eval_index_expression(left: &Value, index: &Value) -> Value {
    match (left, index) {
        (Value::Array(elements), Value::Integer(i)) => {
            if *i < 0 || *i as usize >= elements.len() {
                Value::Null
            } else {
                elements[*i as usize].clone()
            }
        }
        (Value::Hash(hash), index) => match index.hash_key() {
            Some(key) => hash
                .pairs
                .get(&key)
                .map(|pair| pair.value.clone())
                .unwrap_or(Value::Null),
            None => Value::Error(format!("unusable as hash key: {}", index.type_name())),
        },
        _ => Value::Error(format!(
            "index operator not supported: {}",
            left.type_name()
        )),
    }
}

/// Rematerializes a runtime value as a literal expression so a pipe can
/// splice it into the right-hand call's argument list. Hash keys become
/// string literals of their inspect form. Functions and sentinels have
/// no literal form.
fn value_to_expr(value: &Value) -> Option<Expr> {
    match value {
        Value::Integer(n) => Some(Expr::Int(*n)),
        Value::Boolean(b) => Some(Expr::Bool(*b)),
        Value::Str(s) => Some(Expr::Str(Rc::clone(s))),
        Value::Null => Some(Expr::Nihil),
        Value::Array(elements) => {
            let mut exprs = Vec::with_capacity(elements.len());
            for element in elements.iter() {
                exprs.push(value_to_expr(element)?);
            }
            Some(Expr::Array(exprs))
        }
        Value::Hash(hash) => {
            let mut pairs = Vec::with_capacity(hash.pairs.len());
            for pair in hash.pairs.values() {
                let key = Expr::Str(Rc::from(pair.key.inspect().as_str()));
                pairs.push((key, value_to_expr(&pair.value)?));
            }
            Some(Expr::Hash(pairs))
        }
        _ => None,
    }
}
