use std::env;
use std::path::Path;
use walkdir::WalkDir;

const SHADER_DIR: &str = "shaders";
const ENTRY_POINT: &str = "main";

// Compiles every GLSL source under shaders/ to "$OUT_DIR/<name>.<ext>.spv" so it can be embedded with include_bytes!.
fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	assert!(Path::new(SHADER_DIR).exists(), "shader directory \"{SHADER_DIR}\" does not exist!");
	println!("cargo:rerun-if-changed={SHADER_DIR}");

	let out_dir = env::var("OUT_DIR")?;
	let release_build = matches!(env::var("PROFILE"), Ok(profile) if profile == "release");

	let compiler = shaderc::Compiler::new().expect("Failed to create shaderc compiler!");

	let mut compile_errs = vec![];
	for entry in WalkDir::new(SHADER_DIR).into_iter().filter_map(Result::ok) {
		let path = entry.path();
		let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
			continue;
		};

		let kind = match ext {
			"vert" => shaderc::ShaderKind::Vertex,
			"frag" => shaderc::ShaderKind::Fragment,
			_ => panic!("Unsupported shader extension \"{ext}\" for file {entry:?}!"),
		};

		let file_name = entry
			.file_name()
			.to_str()
			.ok_or_else(|| color_eyre::eyre::eyre!("Non utf-8 shader file name {entry:?}!"))?;

		println!("cargo:rerun-if-changed={}", path.display());

		let mut compile_options = shaderc::CompileOptions::new().expect("Failed to create shaderc compile options!");
		compile_options.set_optimization_level(if release_build { shaderc::OptimizationLevel::Performance } else { shaderc::OptimizationLevel::Zero });
		compile_options.set_forced_version_profile(450, shaderc::GlslProfile::Core);
		compile_options.set_target_env(shaderc::TargetEnv::Vulkan, shaderc::EnvVersion::Vulkan1_0 as u32);

		let result = compiler.compile_into_spirv(
			&std::fs::read_to_string(path)?,
			kind,
			file_name,
			ENTRY_POINT,
			Some(&compile_options),
		);

		match result {
			Ok(artifact) => {
				if artifact.get_num_warnings() > 0 {
					println!("cargo:warning={file_name}: {}", artifact.get_warning_messages());
				}

				std::fs::write(Path::new(&out_dir).join(format!("{file_name}.spv")), artifact.as_binary_u8())?;
			},
			Err(err) => compile_errs.push((file_name.to_owned(), err)),
		}
	}

	if !compile_errs.is_empty() {
		let msg = compile_errs
			.into_iter()
			.map(|(file_name, err)| format!("Failed to compile {file_name}!\nError: {err}\n"))
			.collect::<String>();

		panic!("\n{msg}");
	}

	Ok(())
}
