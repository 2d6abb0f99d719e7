use super::context::GraphicsContext;
use super::resource::ResourceId;

/// Vertex entry point every shader source must define.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment entry point every shader source must define.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// A compiled vertex + fragment program.
///
/// A shader that failed to compile stays usable as a value but binds
/// nothing; [`Shader::is_valid`] reports the failure.
pub trait Shader {
    fn id(&self) -> ResourceId;

    fn name(&self) -> &str;

    fn bind(&self, ctx: &mut dyn GraphicsContext);

    fn is_valid(&self) -> bool;
}

/// Returns the entry points `source` is missing.
pub(crate) fn missing_entry_points(source: &str) -> Vec<&'static str> {
    [VERTEX_ENTRY, FRAGMENT_ENTRY]
        .into_iter()
        .filter(|entry| !declares_function(source, entry))
        .collect()
}

/// True when an identifier token `name` directly follows a `fn` token.
fn declares_function(source: &str, name: &str) -> bool {
    let mut after_fn = false;
    source
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .any(|token| {
            let found = after_fn && token == name;
            after_fn = token == "fn";
            found
        })
}

/// Derives a shader name from a file path: `assets/shaders/quad.wgsl` → `quad`.
pub(crate) fn name_from_path(path: &std::path::Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("shader")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_entry_points_present() {
        let src = "fn vs_main(v: V) -> O {}\nfn fs_main(o: O) -> vec4<f32> {}";
        assert!(missing_entry_points(src).is_empty());
    }

    #[test]
    fn entry_points_tolerate_whitespace() {
        let src = "@vertex\nfn vs_main (\n    @location(0) p: vec2<f32>,\n) {}\n@fragment fn\tfs_main\n() {}";
        assert!(missing_entry_points(src).is_empty());
    }

    #[test]
    fn similarly_named_functions_do_not_count() {
        let src = "fn vs_main_helper() {} fn my_fs_main() {}";
        assert_eq!(missing_entry_points(src), vec![VERTEX_ENTRY, FRAGMENT_ENTRY]);
    }

    #[test]
    fn missing_fragment_entry_is_reported() {
        assert_eq!(missing_entry_points("fn vs_main() {}"), vec![FRAGMENT_ENTRY]);
    }

    #[test]
    fn name_is_file_stem() {
        assert_eq!(name_from_path(std::path::Path::new("assets/shaders/quad.wgsl")), "quad");
    }
}
