//! Enum support.
//!
//! Every member of an exposed enum gets its own generic entry point
//! returning the member's integral value, so the generic caller can
//! fetch a named constant without knowing the enclosing enum. Named
//! enums additionally get a case in the per-class operations table
//! keyed by their global type index.

use crate::{GenError, Generator};
use shimgen_model::Enum;

impl<'a> Generator<'a> {
    /// One `x_N` entry returning a single enum member as a `long`.
    /// `qualifier` is the owning class, or the namespace for enums that
    /// are not nested in the emitted class (possibly empty at global
    /// scope).
    pub(crate) fn generate_enum_member_call(
        &self,
        out: &mut String,
        qualifier: &str,
        member: &str,
        index: u32,
    ) {
        out.push_str(&format!("    static void x_{}(Shim::Stack x) {{\n", index));
        out.push_str("        x[0].s_enum = (long)");
        if !qualifier.is_empty() {
            out.push_str(&format!("{}::", qualifier));
        }
        out.push_str(&format!("{};\n", member));
        out.push_str("    }\n");
    }

    /// One case of the per-class operations table: construct, destruct,
    /// assign-from-integral, and read-to-integral for a named enum.
    pub(crate) fn generate_enum_operation_case(
        &self,
        out: &mut String,
        e: &Enum,
    ) -> Result<(), GenError> {
        let type_idx = self
            .indexes
            .type_(&e.spelling)
            .ok_or_else(|| GenError::MissingTypeIndex {
                spelling: e.spelling.to_string(),
            })?;
        let spelling = e.spelling.as_str();

        out.push_str(&format!("        case {}: //{}\n", type_idx, spelling));
        out.push_str("            switch(xop) {\n");
        out.push_str("                case Shim::EnumNew:\n");
        out.push_str(&format!("                    xdata = (void*)new {};\n", spelling));
        out.push_str("                    break;\n");
        out.push_str("                case Shim::EnumDelete:\n");
        out.push_str(&format!("                    delete ({}*)xdata;\n", spelling));
        out.push_str("                    break;\n");
        out.push_str("                case Shim::EnumFromLong:\n");
        out.push_str(&format!(
            "                    *({}*)xdata = ({})xvalue;\n",
            spelling, spelling
        ));
        out.push_str("                    break;\n");
        out.push_str("                case Shim::EnumToLong:\n");
        out.push_str(&format!(
            "                    xvalue = (long)*({}*)xdata;\n",
            spelling
        ));
        out.push_str("                    break;\n");
        out.push_str("            }\n");
        out.push_str("            break;\n");
        Ok(())
    }
}
