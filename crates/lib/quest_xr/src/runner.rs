use bevy::app::{AppExit, PluginsState};
use bevy::prelude::*;
use quest_xr_gfx::xr::XrProgram;

/// Runs `app` until it requests an exit. On Android this owns the activity's looper.
pub fn xr_runner(mut app: App) -> AppExit {
	while app.plugins_state() == PluginsState::Adding {
		bevy::tasks::tick_global_task_pools_on_main_thread();
	}

	app.finish();
	app.cleanup();

	#[cfg(target_os = "android")]
	return android::run(app);

	#[cfg(not(target_os = "android"))]
	desktop::run(app)
}

fn session_running(app: &App) -> bool {
	app.world()
		.get_resource::<XrProgram>()
		.is_some_and(XrProgram::is_running)
}

#[cfg(not(target_os = "android"))]
mod desktop {
	use std::thread;
	use std::time::Duration;
	use super::*;

	const IDLE_SLEEP: Duration = Duration::from_millis(100);

	pub fn run(mut app: App) -> AppExit {
		loop {
			app.update();

			if let Some(exit) = app.should_exit() {
				return exit;
			}

			// Don't spin while the runtime has not started the session.
			if !session_running(&app) {
				thread::sleep(IDLE_SLEEP);
			}
		}
	}
}

#[cfg(target_os = "android")]
mod android {
	use std::time::Duration;
	use bevy::window::android_activity::{MainEvent, PollEvent};
	use bevy::window::ANDROID_APP;
	use jni::objects::JObject;
	use jni::JavaVM;
	use super::*;

	pub fn run(mut app: App) -> AppExit {
		let Some(android_app) = ANDROID_APP.get().cloned() else {
			error!("Android app is not initialized. The runner must be started from #[bevy_main]");
			return AppExit::error();
		};

		let ctx = ndk_context::android_context();
		let vm = match unsafe { JavaVM::from_raw(ctx.vm().cast()) } {
			Ok(vm) => vm,
			Err(e) => {
				error!("Failed to get the Java VM: {e}");
				return AppExit::error();
			},
		};

		// The OpenXR loader calls into Java on this thread.
		let mut env = match vm.attach_current_thread() {
			Ok(env) => env,
			Err(e) => {
				error!("Failed to attach the main thread to the Java VM: {e}");
				return AppExit::error();
			},
		};

		let mut resumed = false;
		let mut destroy_requested = false;

		loop {
			// Block on the looper only while there is nothing to render.
			let timeout = match !resumed && !session_running(&app) && !destroy_requested {
				true => None,
				false => Some(Duration::ZERO),
			};

			android_app.poll_events(timeout, |event| {
				let PollEvent::Main(event) = event else {
					return;
				};

				match event {
					MainEvent::Start => info!("onStart()"),
					MainEvent::Resume { .. } => {
						info!("onResume()");
						resumed = true;
					},
					MainEvent::Pause => {
						info!("onPause()");
						resumed = false;
					},
					MainEvent::Stop => info!("onStop()"),
					MainEvent::Destroy => {
						info!("onDestroy()");
						destroy_requested = true;
					},
					MainEvent::InitWindow { .. } => info!("surfaceCreated()"),
					MainEvent::TerminateWindow { .. } => info!("surfaceDestroyed()"),
					event => debug!("Android event {event:?}"),
				}
			});

			if destroy_requested {
				return app.should_exit().unwrap_or(AppExit::Success);
			}

			app.update();

			if let Some(exit) = app.should_exit() {
				// Let the activity go away with the session.
				let activity = unsafe { JObject::from_raw(ctx.context().cast()) };
				if let Err(e) = env.call_method(&activity, "finish", "()V", &[]) {
					error!("Failed to finish the activity: {e}");
				}

				return exit;
			}
		}
	}
}
