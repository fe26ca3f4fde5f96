use csv_form::codec::{LineEnding, load_file, save_file, serialize_with};
use csv_form::{Editor, Result, Table, parse, serialize};

/// Small deterministic generator so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> usize {
        (self.next() % n) as usize
    }

    fn field(&mut self) -> String {
        const ALPHABET: &[char] = &['a', 'Z', '7', ' ', '-', '"', 'é', ';', '\t', '.'];
        let len = self.below(6);
        (0..len)
            .map(|_| ALPHABET[self.below(ALPHABET.len() as u64)])
            .collect()
    }
}

fn random_table(rng: &mut Lcg) -> Result<Table> {
    let cols = 1 + rng.below(5);
    let rows = rng.below(8);
    let headers = (0..cols).map(|_| rng.field()).collect();
    let data = (0..rows)
        .map(|_| (0..cols).map(|_| rng.field()).collect())
        .collect();
    Table::new(headers, data)
}

#[test]
fn parse_is_left_inverse_of_serialize() -> Result<()> {
    let mut rng = Lcg(0x5eed);
    for _ in 0..200 {
        let table = random_table(&mut rng)?;
        assert_eq!(parse(&serialize(&table))?, table);
        assert_eq!(parse(&serialize_with(&table, LineEnding::CrLf))?, table);
    }
    Ok(())
}

#[test]
fn row_count_matches_non_header_lines() -> Result<()> {
    let text = "id,label\n1,one\n2,two\n3,three\n4,four\n";
    let table = parse(text)?;
    assert_eq!(table.row_count(), text.lines().count() - 1);
    Ok(())
}

#[test]
fn commit_isolation_holds_for_every_row() -> Result<()> {
    let base = parse("k,v\na,1\nb,2\nc,3\nd,4\n")?;
    for target in 0..base.row_count() {
        let mut table = base.clone();
        let mut editor = Editor::default();
        editor.on_select(&table, Some(target))?;
        editor.focus_next();
        editor.input_insert('!');
        editor.commit(&mut table)?;

        for row in 0..table.row_count() {
            if row == target {
                assert_ne!(table.row(row)?, base.row(row)?);
            } else {
                assert_eq!(table.row(row)?, base.row(row)?);
            }
        }
    }
    Ok(())
}

#[test]
fn load_edit_save_reload() -> Result<()> {
    let dir = tempfile::tempdir().map_err(|e| csv_form::Error::Io {
        path: "tempdir".into(),
        source: e,
    })?;
    let path = dir.path().join("people.csv");
    let original = parse("name,age\nAlice,30\nBob,25\n")?;
    save_file(&path, &original, LineEnding::Lf)?;

    let (mut table, ending) = load_file(&path)?;
    let mut editor = Editor::default();
    editor.on_select(&table, Some(1))?;
    editor.focus_next();
    editor.input_backspace();
    editor.input_insert('6');
    editor.commit(&mut table)?;
    save_file(&path, &table, ending)?;

    let (reloaded, _) = load_file(&path)?;
    assert_eq!(serialize(&reloaded), "name,age\nAlice,30\nBob,26\n");
    Ok(())
}
