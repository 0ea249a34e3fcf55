use log::{debug, error, info};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no item with id {0}")]
    NotFound(i32),
    #[error("item has no answers")]
    NoAnswers,
    #[error("correct index {correct} is out of range for {answers} answers")]
    BadCorrectIndex { correct: usize, answers: usize },
    #[error("cannot encode answers: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub option: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub category: String,
    pub question: String,
    #[serde(rename = "targetWord")]
    pub target_word: String,
    pub answers: Vec<Answer>,
    pub correct: usize,
}

impl Item {
    pub fn validate(&self) -> Result<(), Error> {
        if self.answers.is_empty() {
            return Err(Error::NoAnswers);
        }
        if self.correct >= self.answers.len() {
            return Err(Error::BadCorrectIndex {
                correct: self.correct,
                answers: self.answers.len(),
            });
        }
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Item> {
        let answers_json: String = row.get(4)?;
        let answers = serde_json::from_str(&answers_json)
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(err)))?;
        Ok(Item {
            id: row.get(0)?,
            category: row.get(1)?,
            question: row.get(2)?,
            target_word: row.get(3)?,
            answers,
            correct: row.get(5)?,
        })
    }

    pub fn get_all(conn: &Connection) -> Result<Vec<Item>, Error> {
        let mut statement = conn.prepare("SELECT * FROM Item")?;
        let rows = statement.query_map([], |row| Self::from_row(row))?;

        Ok(rows.collect::<rusqlite::Result<Vec<Item>>>()?)
    }

    pub fn get_by_id(conn: &Connection, id: i32) -> Result<Item, Error> {
        let mut statement = conn.prepare("SELECT * FROM Item WHERE id = :id LIMIT 1")?;
        match statement.query_row(&[(":id", &id)], |row| Self::from_row(row)) {
            Ok(item) => Ok(item),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::NotFound(id)),
            Err(err) => {
                error!("[DB] Error while fetching Item {}: {:?}", id, err);
                Err(err.into())
            }
        }
    }

    pub fn get_in_category(conn: &Connection, category: &str) -> Result<Vec<Item>, Error> {
        let mut statement = conn.prepare("SELECT * FROM Item WHERE category = :category")?;
        let rows = statement.query_map(&[(":category", &category)], |row| Self::from_row(row))?;

        Ok(rows.collect::<rusqlite::Result<Vec<Item>>>()?)
    }

    /// Persists a new Item and returns the id the store assigned to it. Any
    /// id already set on `src` is ignored.
    pub fn add(conn: &Connection, src: &Item) -> Result<i32, Error> {
        src.validate()?;
        let answers = serde_json::to_string(&src.answers)?;
        match conn.execute(
            "INSERT INTO Item(category, question, targetWord, answers, correct) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![src.category, src.question, src.target_word, answers, src.correct],
        ) {
            Ok(_) => {
                let id = conn.last_insert_rowid() as i32;
                debug!("[DB] Created new Item {} in category '{}'", id, src.category);
                Ok(id)
            }
            Err(err) => {
                error!("[DB] Error while creating new Item: {:?}", err);
                Err(err.into())
            }
        }
    }

    /// Adds each item in order and stops at the first failure. Items added
    /// before the failure stay committed, there is no rollback.
    pub fn add_batch(conn: &Connection, items: &[Item]) -> Result<Vec<i32>, Error> {
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            ids.push(Self::add(conn, item)?);
        }
        Ok(ids)
    }

    pub fn duplicate(conn: &Connection, id: i32) -> Result<i32, Error> {
        let source = Self::get_by_id(conn, id)?;
        let new_id = Self::add(conn, &source)?;
        debug!("[DB] Duplicated Item {} as Item {}", id, new_id);
        Ok(new_id)
    }

    pub fn update(conn: &Connection, id: i32, src: &Item) -> Result<(), Error> {
        src.validate()?;
        let answers = serde_json::to_string(&src.answers)?;
        match conn.execute(
            "UPDATE Item \
             SET category = ?2, question = ?3, targetWord = ?4, answers = ?5, correct = ?6 \
             WHERE id = ?1",
            params![id, src.category, src.question, src.target_word, answers, src.correct],
        ) {
            Ok(0) => Err(Error::NotFound(id)),
            Ok(_) => {
                debug!("[DB] Updated Item {}", id);
                Ok(())
            }
            Err(err) => {
                error!("[DB] Error while updating Item {}: {:?}", id, err);
                Err(err.into())
            }
        }
    }

    pub fn delete(conn: &Connection, id: i32) -> Result<(), Error> {
        match conn.execute("DELETE FROM Item WHERE id = ?1", params![id]) {
            Ok(_) => {
                debug!("[DB] Deleted Item '{}'", id);
                Ok(())
            }
            Err(err) => {
                error!("[DB] Error while deleting Item {}: {:?}", id, err);
                Err(err.into())
            }
        }
    }
}

pub(crate) fn create_or_open(src: &Path) -> rusqlite::Result<Connection> {
    if src.exists() {
        info!("[DB] Opening existing Database");
        open_db(src)
    } else {
        info!("[DB] Creating new Database");
        create_db(src)
    }
}

pub(crate) fn create_db(dest: &Path) -> rusqlite::Result<Connection> {
    let now = Instant::now();
    let db = init_db(Connection::open(dest)?)?;
    debug!("[DB] Creating took {} ms.", now.elapsed().as_millis());
    Ok(db)
}

pub(crate) fn open_db(src: &Path) -> rusqlite::Result<Connection> {
    let now = Instant::now();
    let db = Connection::open(src)?;
    debug!("[DB] Opening took {} ms.", now.elapsed().as_millis());
    Ok(db)
}

pub(crate) fn close_db(connection: Connection) -> rusqlite::Result<()> {
    info!("[DB] Closing Database");
    let mut db = connection;
    for attempt in 1..=2 {
        match db.close() {
            Ok(_) => return Ok(()),
            Err((conn, _)) => {
                error!("[DB] Cannot close connection. Retrying {}/2...", attempt);
                db = conn;
            }
        }
    }
    match db.close() {
        Ok(_) => Ok(()),
        Err(_) => panic!("[DB] Cannot close connection! Aborting."),
    }
}

pub(crate) fn init_db(conn: Connection) -> rusqlite::Result<Connection> {
    info!("[DB INIT] Creating tables");
    conn.execute(
        "CREATE TABLE Item (
              id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
              category TEXT NOT NULL,
              question TEXT NOT NULL,
              targetWord TEXT NOT NULL,
              answers TEXT NOT NULL,
              correct INTEGER NOT NULL
            )",
        (),
    )?;
    info!("[DB INIT] Created table Item");
    conn.execute("CREATE INDEX Item_category_idx ON Item(category)", ())?;
    info!("[DB INIT] Created index Item_category_idx");
    info!("[DB INIT] Database Creation Successful!");

    Ok(conn)
}
