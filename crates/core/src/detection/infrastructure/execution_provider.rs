use ort::execution_providers::ExecutionProviderDispatch;

/// Hardware-accelerated ONNX execution providers for the current platform.
///
/// An empty list means ONNX Runtime's default CPU provider. Registered
/// providers that fail to initialize also fall back to CPU.
pub fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
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
        Vec::new()
    }
}
