use crate::vm::{Vm, VmConfig, VmError};
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::JsValue;

impl From<VmError> for JsValue {
    fn from(err: VmError) -> JsValue {
        JsValue::from(format!("tridollar error occurred: {}", err))
    }
}

/// Parses and runs `source`, returning the printed lines joined by newlines.
pub fn render(source: &str) -> Result<String, VmError> {
    let mut vm = Vm::from_source(source, VmConfig::suppressed())?;
    let trace = vm.run()?;

    Ok(trace.output.join("\n"))
}

#[wasm_bindgen]
pub fn run(source: &str) -> Result<String, JsValue> {
    Ok(render(source)?)
}
