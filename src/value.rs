use crate::ir::{ComparisonOp, Number};
use std::cmp::Ordering;
use std::fmt::{self, Display};
use thiserror::Error;

/// A runtime value held by a register or memory cell.
///
/// `Int` and `Float` are two representations of the same number type: integer arithmetic stays
/// integral and any floating operand makes the result floating.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum ValueError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("negative shift count {0}")]
    NegativeShift(i64),
    #[error("expected a number, found string \"{0}\"")]
    NotANumber(String),
    #[error("cannot order a {0} against a {1}")]
    Incomparable(&'static str, &'static str),
}

impl ValueError {
    /// Arithmetic faults as opposed to type mismatches.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            ValueError::DivisionByZero | ValueError::Overflow | ValueError::NegativeShift(_)
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(value) => value as f64,
            Num::Float(value) => value,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(value) => value == 0,
            Num::Float(value) => value == 0.0,
        }
    }
}

impl Default for Value {
    /// Unset registers and memory cells read as integer zero.
    fn default() -> Self {
        Value::Int(0)
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(value) => Value::Int(value),
            Number::Float(value) => Value::Float(value),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{:?}", value),
            Value::Str(text) => f.write_str(text),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) | Value::Float(_) => "number",
            Value::Str(_) => "string",
        }
    }

    fn number(&self) -> Result<Num, ValueError> {
        match self {
            Value::Int(value) => Ok(Num::Int(*value)),
            Value::Float(value) => Ok(Num::Float(*value)),
            Value::Str(text) => {
                let trimmed = text.trim();
                if let Ok(value) = trimmed.parse::<i64>() {
                    return Ok(Num::Int(value));
                }
                match trimmed.parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok(Num::Float(value)),
                    _ => Err(ValueError::NotANumber(text.clone())),
                }
            }
        }
    }

    /// Integer view used by the bitwise operations and string indexing. Floats truncate
    /// toward zero.
    pub fn to_int(&self) -> Result<i64, ValueError> {
        Ok(match self.number()? {
            Num::Int(value) => value,
            Num::Float(value) => value.trunc() as i64,
        })
    }

    fn numeric(
        &self,
        rhs: &Value,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Value, ValueError> {
        match (self.number()?, rhs.number()?) {
            (Num::Int(a), Num::Int(b)) => int_op(a, b).map(Value::Int).ok_or(ValueError::Overflow),
            (a, b) => Ok(Value::Float(float_op(a.as_f64(), b.as_f64()))),
        }
    }

    pub fn add(&self, rhs: &Value) -> Result<Value, ValueError> {
        self.numeric(rhs, i64::checked_add, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value, ValueError> {
        self.numeric(rhs, i64::checked_sub, |a, b| a - b)
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value, ValueError> {
        self.numeric(rhs, i64::checked_mul, |a, b| a * b)
    }

    /// True division: two integers divide to an integer only when the division is exact.
    pub fn div(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (lhs, rhs) = (self.number()?, rhs.number()?);
        if rhs.is_zero() {
            return Err(ValueError::DivisionByZero);
        }
        match (lhs, rhs) {
            (Num::Int(a), Num::Int(b)) if a.wrapping_rem(b) == 0 => {
                a.checked_div(b).map(Value::Int).ok_or(ValueError::Overflow)
            }
            (a, b) => Ok(Value::Float(a.as_f64() / b.as_f64())),
        }
    }

    /// Floor modulo: a non-zero result takes the sign of the divisor.
    pub fn rem(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (lhs, rhs) = (self.number()?, rhs.number()?);
        if rhs.is_zero() {
            return Err(ValueError::DivisionByZero);
        }
        match (lhs, rhs) {
            (Num::Int(a), Num::Int(b)) => {
                let r = a.wrapping_rem(b);
                if r != 0 && (r < 0) != (b < 0) {
                    Ok(Value::Int(r + b))
                } else {
                    Ok(Value::Int(r))
                }
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                let r = a % b;
                if r != 0.0 && (r < 0.0) != (b < 0.0) {
                    Ok(Value::Float(r + b))
                } else {
                    Ok(Value::Float(r))
                }
            }
        }
    }

    pub fn bit_and(&self, rhs: &Value) -> Result<Value, ValueError> {
        Ok(Value::Int(self.to_int()? & rhs.to_int()?))
    }

    pub fn bit_or(&self, rhs: &Value) -> Result<Value, ValueError> {
        Ok(Value::Int(self.to_int()? | rhs.to_int()?))
    }

    pub fn bit_xor(&self, rhs: &Value) -> Result<Value, ValueError> {
        Ok(Value::Int(self.to_int()? ^ rhs.to_int()?))
    }

    pub fn bit_not(&self) -> Result<Value, ValueError> {
        Ok(Value::Int(!self.to_int()?))
    }

    /// Left shift that refuses to drop significant bits.
    pub fn shl(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (value, count) = (self.to_int()?, rhs.to_int()?);
        if count < 0 {
            return Err(ValueError::NegativeShift(count));
        }
        if value == 0 {
            return Ok(Value::Int(0));
        }
        if count >= 64 {
            return Err(ValueError::Overflow);
        }
        let shifted = value << count;
        if shifted >> count != value {
            return Err(ValueError::Overflow);
        }

        Ok(Value::Int(shifted))
    }

    /// Arithmetic right shift. Counts of 64 or more leave only the sign.
    pub fn shr(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (value, count) = (self.to_int()?, rhs.to_int()?);
        if count < 0 {
            return Err(ValueError::NegativeShift(count));
        }
        if count >= 64 {
            return Ok(Value::Int(if value < 0 { -1 } else { 0 }));
        }

        Ok(Value::Int(value >> count))
    }

    pub fn concat(&self, rhs: &Value) -> Value {
        Value::Str(format!("{}{}", self, rhs))
    }

    /// Length in characters of the value's text form.
    pub fn length(&self) -> Value {
        Value::Int(self.to_string().chars().count() as i64)
    }

    /// Characters `[start, start + len)` of the value's text form, clamped to the text.
    /// Negative bounds count as zero.
    pub fn substr(&self, start: i64, len: i64) -> Value {
        let start = start.max(0) as usize;
        let len = len.max(0) as usize;
        Value::Str(self.to_string().chars().skip(start).take(len).collect())
    }

    /// Applies a comparison operator. Numbers compare numerically, strings lexicographically.
    /// A number never equals a string and cannot be ordered against one.
    pub fn compare(&self, op: ComparisonOp, rhs: &Value) -> Result<bool, ValueError> {
        let ordering = match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                return match op {
                    ComparisonOp::Eq => Ok(false),
                    ComparisonOp::Ne => Ok(true),
                    _ => Err(ValueError::Incomparable(self.type_name(), rhs.type_name())),
                };
            }
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            _ => self.number()?.as_f64().partial_cmp(&rhs.number()?.as_f64()),
        };

        Ok(match ordering {
            Some(ordering) => match op {
                ComparisonOp::Eq => ordering == Ordering::Equal,
                ComparisonOp::Ne => ordering != Ordering::Equal,
                ComparisonOp::Lt => ordering == Ordering::Less,
                ComparisonOp::Gt => ordering == Ordering::Greater,
                ComparisonOp::Le => ordering != Ordering::Greater,
                ComparisonOp::Ge => ordering != Ordering::Less,
            },
            // NaN is unordered and unequal to everything
            None => op == ComparisonOp::Ne,
        })
    }
}
