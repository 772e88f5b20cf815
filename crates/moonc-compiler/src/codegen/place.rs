//! Where a resolved value lives once its producing code has run, and how to
//! load it into a register or store a register's value back into it
//! (§4.4 "Loading/storing values": `load_in_reg`/`store_from_reg`).

use moonc_core::Record;

use super::error::CodegenError;
use super::registers::{Reg, RegisterPool};
use super::FuncBuilder;

#[derive(Debug, Clone)]
pub(super) enum Place {
    /// A plain `-offset(r14)` stack slot: locals, non-pointer params,
    /// data members resolved directly in the current frame, and every
    /// node's own arithmetic-result temp.
    Frame(Record),
    /// A pointer parameter: its slot holds an address to dereference once.
    ThroughPointer(Record),
    /// A value at `-offset(base)`, where `base` is an address already
    /// loaded into a register (threaded through a chain of `.` accesses).
    /// The caller owns `base` and must release it via `Place::release`.
    ThroughAddress(Reg, i32),
    /// An indexed access: the element's absolute address was computed and
    /// stored into this temp slot; dereference it at offset 0.
    ThroughTemp(Record),
    /// An integer literal embedded directly as an `addi` immediate.
    Literal(String),
}

impl Place {
    /// Releases any register this place still owns. Every caller that
    /// obtains a `Place` must call this once it has finished loading from
    /// or storing to it.
    pub(super) fn release(self, pool: &mut RegisterPool) {
        if let Place::ThroughAddress(reg, _) = self {
            pool.release(reg);
        }
    }
}

impl<'a> FuncBuilder<'a> {
    pub(super) fn load_place(&mut self, code: &mut Vec<crate::ast::Line>, place: &Place, reg: &str) -> Result<(), CodegenError> {
        match place {
            Place::Frame(record) => code.push(crate::ast::Line::new("lw", vec![reg.to_string(), record.memory_location()])),
            Place::ThroughPointer(record) => self.dereference(code, record, 0, reg)?,
            Place::ThroughAddress(base, offset) => {
                code.push(crate::ast::Line::new("lw", vec![reg.to_string(), format!("{}({})", -offset, base)]));
            }
            Place::ThroughTemp(temp) => self.dereference(code, temp, 0, reg)?,
            Place::Literal(lexeme) => code.push(crate::ast::Line::new("addi", vec![reg.to_string(), "r0".into(), lexeme.clone()])),
        }
        Ok(())
    }

    pub(super) fn store_place(&mut self, code: &mut Vec<crate::ast::Line>, place: &Place, reg: &str) -> Result<(), CodegenError> {
        match place {
            Place::Frame(record) => code.push(crate::ast::Line::new("sw", vec![record.memory_location(), reg.to_string()])),
            Place::ThroughPointer(record) => {
                let addr = self.pool.acquire()?;
                code.push(crate::ast::Line::new("lw", vec![addr.name().to_string(), record.memory_location()]));
                code.push(crate::ast::Line::new("sw", vec![format!("0({})", addr.name()), reg.to_string()]));
                self.pool.release(addr);
            }
            Place::ThroughAddress(base, offset) => {
                code.push(crate::ast::Line::new("sw", vec![format!("{}({})", -offset, base), reg.to_string()]));
            }
            Place::ThroughTemp(temp) => {
                let addr = self.pool.acquire()?;
                code.push(crate::ast::Line::new("lw", vec![addr.name().to_string(), temp.memory_location()]));
                code.push(crate::ast::Line::new("sw", vec![format!("0({})", addr.name()), reg.to_string()]));
                self.pool.release(addr);
            }
            Place::Literal(lexeme) => {
                return Err(CodegenError::Internal(format!("cannot assign to literal '{lexeme}'")));
            }
        }
        Ok(())
    }

    /// Loads `record`'s address (not its value) into a fresh register, used
    /// when a chain segment continues past this one (`a.b.c`).
    pub(super) fn place_address(&mut self, code: &mut Vec<crate::ast::Line>, place: &Place) -> Result<Reg, CodegenError> {
        let reg = self.pool.acquire()?;
        match place {
            Place::Frame(record) => {
                code.push(crate::ast::Line::new("addi", vec![reg.name().to_string(), "r14".into(), format!("{}", -record.offset.unwrap_or(0))]));
            }
            Place::ThroughPointer(record) => {
                code.push(crate::ast::Line::new("lw", vec![reg.name().to_string(), record.memory_location()]));
            }
            Place::ThroughAddress(base, offset) => {
                code.push(crate::ast::Line::new("addi", vec![reg.name().to_string(), base.name().to_string(), format!("{}", -offset)]));
            }
            Place::ThroughTemp(temp) => {
                code.push(crate::ast::Line::new("lw", vec![reg.name().to_string(), temp.memory_location()]));
            }
            Place::Literal(_) => {
                self.pool.release(reg);
                return Err(CodegenError::Internal("cannot take the address of a literal".into()));
            }
        }
        Ok(reg)
    }

    pub(super) fn dereference(&mut self, code: &mut Vec<crate::ast::Line>, record: &Record, offset: i32, reg: &str) -> Result<(), CodegenError> {
        let addr = self.pool.acquire()?;
        code.push(crate::ast::Line::new("lw", vec![addr.name().to_string(), record.memory_location()]));
        code.push(crate::ast::Line::new("lw", vec![reg.to_string(), format!("{}({})", -offset, addr.name())]));
        self.pool.release(addr);
        Ok(())
    }
}
