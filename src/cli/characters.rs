use crate::ai::character::CharacterCatalog;

/// Print the built-in characters and their prompts
pub fn run() {
    let catalog = CharacterCatalog::builtin();
    for character in catalog.iter() {
        println!("{}\n  {}\n", character.name, character.system_prompt);
    }
}
