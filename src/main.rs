fn main() {
	quest_xr_app::main();
}
