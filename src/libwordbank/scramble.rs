use log::{debug, warn};
use rand::rng;
use rand::seq::SliceRandom;
use rusqlite::Connection;

use crate::libwordbank::db::{Error, Item};

/// Reorders `item.answers` uniformly at random and moves `correct` so it
/// still points at the answer it pointed at before the shuffle.
pub fn scramble_answers(item: &mut Item) -> Result<(), Error> {
    item.validate()?;
    let keep = item.answers[item.correct].clone();
    item.answers.shuffle(&mut rng());
    item.correct = item.answers.iter().position(|a| *a == keep).unwrap();
    Ok(())
}

pub fn scramble_all_answers(items: &mut [Item]) -> Result<(), Error> {
    for item in items.iter_mut() {
        scramble_answers(item)?;
    }
    Ok(())
}

pub fn scramble_by_id(conn: &Connection, id: i32) -> Result<Item, Error> {
    let mut item = Item::get_by_id(conn, id)?;
    scramble_answers(&mut item)?;
    Item::update(conn, id, &item)?;
    debug!(
        "[Scramble] Reordered {} answers of Item {}",
        item.answers.len(),
        id
    );
    Ok(item)
}

pub fn scramble_all(conn: &Connection) -> Result<Vec<Item>, Error> {
    let mut items = Item::get_all(conn)?;
    scramble_all_answers(&mut items)?;
    for item in &items {
        match item.id {
            Some(id) => Item::update(conn, id, item)?,
            None => warn!("[Scramble] Item does not have an `id`! Skipping..."),
        }
    }
    debug!("[Scramble] Reordered answers of {} Items", items.len());
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libwordbank::db::{init_db, Answer};
    use std::collections::HashSet;

    fn answer(option: &str) -> Answer {
        Answer {
            option: option.to_string(),
            url: None,
        }
    }

    fn item(options: &[&str], correct: usize) -> Item {
        Item {
            id: None,
            category: "colors".to_string(),
            question: "Pick red".to_string(),
            target_word: "red".to_string(),
            answers: options.iter().map(|o| answer(o)).collect(),
            correct,
        }
    }

    #[test]
    fn scramble_preserves_the_correct_answer() {
        for _ in 0..100 {
            let mut it = item(&["red", "blue", "green", "yellow"], 2);
            scramble_answers(&mut it).unwrap();
            assert_eq!(it.answers.len(), 4);
            assert_eq!(it.answers[it.correct], answer("green"));
        }
    }

    #[test]
    fn scramble_produces_multiple_orderings() {
        let mut seen = HashSet::new();
        let mut moved_first = false;
        for _ in 0..200 {
            let mut it = item(&["red", "blue", "green", "yellow"], 0);
            scramble_answers(&mut it).unwrap();
            if it.answers[0] != answer("red") {
                moved_first = true;
            }
            let order: Vec<String> = it.answers.iter().map(|a| a.option.clone()).collect();
            seen.insert(order);
        }
        assert!(seen.len() > 1);
        assert!(moved_first);
    }

    #[test]
    fn single_answer_item_keeps_correct_at_zero() {
        let mut it = item(&["red"], 0);
        scramble_answers(&mut it).unwrap();
        assert_eq!(it.answers, vec![answer("red")]);
        assert_eq!(it.correct, 0);
    }

    #[test]
    fn scramble_rejects_invalid_items() {
        let mut empty = item(&[], 0);
        assert!(matches!(scramble_answers(&mut empty), Err(Error::NoAnswers)));

        let mut out_of_range = item(&["red", "blue"], 2);
        assert!(matches!(
            scramble_answers(&mut out_of_range),
            Err(Error::BadCorrectIndex { .. })
        ));
    }

    #[test]
    fn scramble_all_answers_treats_items_independently() {
        let mut items = vec![item(&["red", "blue"], 0), item(&["cat", "dog"], 1)];
        scramble_all_answers(&mut items).unwrap();
        assert_eq!(items[0].answers[items[0].correct], answer("red"));
        assert_eq!(items[1].answers[items[1].correct], answer("dog"));
    }

    #[test]
    fn scramble_by_id_commits_the_reordering() {
        let conn = init_db(Connection::open_in_memory().unwrap()).unwrap();
        let id = Item::add(&conn, &item(&["red", "blue", "green"], 1)).unwrap();

        let scrambled = scramble_by_id(&conn, id).unwrap();
        assert_eq!(scrambled.answers[scrambled.correct], answer("blue"));

        let stored = Item::get_by_id(&conn, id).unwrap();
        assert_eq!(stored.answers, scrambled.answers);
        assert_eq!(stored.correct, scrambled.correct);
    }

    #[test]
    fn scramble_by_id_missing_is_not_found() {
        let conn = init_db(Connection::open_in_memory().unwrap()).unwrap();
        assert!(matches!(scramble_by_id(&conn, 7), Err(Error::NotFound(7))));
    }

    #[test]
    fn scramble_all_commits_every_item() {
        let conn = init_db(Connection::open_in_memory().unwrap()).unwrap();
        let first = Item::add(&conn, &item(&["red", "blue"], 0)).unwrap();
        let second = Item::add(&conn, &item(&["cat", "dog"], 1)).unwrap();

        let scrambled = scramble_all(&conn).unwrap();
        assert_eq!(scrambled.len(), 2);

        let stored_first = Item::get_by_id(&conn, first).unwrap();
        assert_eq!(stored_first.answers[stored_first.correct], answer("red"));
        let stored_second = Item::get_by_id(&conn, second).unwrap();
        assert_eq!(stored_second.answers[stored_second.correct], answer("dog"));
    }
}
