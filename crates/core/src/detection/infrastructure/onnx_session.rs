//! ONNX Runtime session construction shared by every inference stage.

use std::path::Path;

use ort::session::Session;

use super::preprocess::InputSpec;

/// Execution providers to try before ORT's built-in CPU provider.
fn platform_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Opens an ONNX model, registering the platform's accelerated provider
/// when one exists. ORT falls back to CPU if registration fails.
pub fn load_session(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    let session = Session::builder()?
        .with_execution_providers(platform_execution_providers())?
        .commit_from_file(model_path)?;
    log::debug!(
        "loaded {} ({} inputs, {} outputs)",
        model_path.display(),
        session.inputs().len(),
        session.outputs().len()
    );
    Ok(session)
}

/// Reads the NCHW input layout from the model, falling back to `fallback`
/// for any dimension that is dynamic or missing.
pub fn input_spec(session: &Session, fallback: InputSpec) -> InputSpec {
    let dims = session.inputs().first().and_then(|input| {
        if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
            if shape.len() >= 4 {
                Some([shape[1], shape[2], shape[3]])
            } else {
                None
            }
        } else {
            None
        }
    });

    match dims {
        Some([c, h, w]) => InputSpec {
            channels: if c > 0 { c as usize } else { fallback.channels },
            height: if h > 0 { h as u32 } else { fallback.height },
            width: if w > 0 { w as u32 } else { fallback.width },
        },
        None => fallback,
    }
}
