//! Native functions. Always available, no declaration required.
//!
//! The table is immutable and shared by every program run. Identifier
//! resolution only falls back to it when no binding exists in scope, so a
//! program may shadow any builtin with `let`.

use std::fmt;

use crate::runtime::object::Object;

/// A builtin returns its result, or the message of an error object.
pub type BuiltinFn = fn(&[Object]) -> Result<Object, String>;

pub struct Builtin {
    pub name: &'static str,
    func: BuiltinFn,
}

impl Builtin {
    pub fn call(&self, args: &[Object]) -> Object {
        tracing::trace!(name = self.name, argc = args.len(), "builtin call");
        (self.func)(args).unwrap_or_else(Object::Error)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

// ─── Registry ─────────────────────────────────────────────────────────────────

static BUILTINS: [Builtin; 6] = [
    Builtin { name: "len",   func: len },
    Builtin { name: "first", func: first },
    Builtin { name: "last",  func: last },
    Builtin { name: "rest",  func: rest },
    Builtin { name: "push",  func: push },
    Builtin { name: "puts",  func: puts },
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

pub fn all() -> &'static [Builtin] {
    &BUILTINS
}

// ─── Shared helpers ───────────────────────────────────────────────────────────

pub(crate) fn check_argc(args: &[Object], n: usize) -> Result<(), String> {
    if args.len() != n {
        Err(wrong_arg_count(args.len(), n))
    } else {
        Ok(())
    }
}

pub(crate) fn wrong_arg_count(got: usize, want: usize) -> String {
    format!("wrong number of arguments. got={got}, want={want}")
}

fn as_array<'a>(name: &str, v: &'a Object) -> Result<&'a [Object], String> {
    match v {
        Object::Array(items) => Ok(items.as_slice()),
        other => Err(format!("argument to `{name}` must be ARRAY, got {}", other.type_name())),
    }
}

// ─── Implementations ──────────────────────────────────────────────────────────

fn len(args: &[Object]) -> Result<Object, String> {
    check_argc(args, 1)?;
    let n = match &args[0] {
        Object::Str(s)       => s.len(),
        Object::Array(items) => items.len(),
        other => return Err(format!("argument to `len` not supported, got {}", other.type_name())),
    };
    Ok(Object::Integer(n as i64))
}

fn first(args: &[Object]) -> Result<Object, String> {
    check_argc(args, 1)?;
    let items = as_array("first", &args[0])?;
    Ok(items.first().cloned().unwrap_or(Object::NULL))
}

fn last(args: &[Object]) -> Result<Object, String> {
    check_argc(args, 1)?;
    let items = as_array("last", &args[0])?;
    Ok(items.last().cloned().unwrap_or(Object::NULL))
}

fn rest(args: &[Object]) -> Result<Object, String> {
    check_argc(args, 1)?;
    let items = as_array("rest", &args[0])?;
    match items.split_first() {
        Some((_, tail)) => Ok(Object::array(tail.to_vec())),
        None => Ok(Object::NULL),
    }
}

fn push(args: &[Object]) -> Result<Object, String> {
    check_argc(args, 2)?;
    let items = as_array("push", &args[0])?;
    let mut out = Vec::with_capacity(items.len() + 1);
    out.extend_from_slice(items);
    out.push(args[1].clone());
    Ok(Object::array(out))
}

fn puts(args: &[Object]) -> Result<Object, String> {
    for arg in args {
        println!("{arg}");
    }
    Ok(Object::NULL)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
