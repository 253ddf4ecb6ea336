//! Processing engine integration tests.

use std::io::Cursor;

use pretty_assertions::assert_eq;
use wavproc::{
    AudioError, Frame, Inputs, Sample, Session, Source, Unseekable, WavReader, WavWriter,
};

fn stream(frames: &[[i32; 2]]) -> WavReader<Cursor<Vec<u8>>> {
    let mut writer = WavWriter::create(Cursor::new(Vec::new())).unwrap();
    writer.append_all(frames).unwrap();
    let (mut cursor, _) = writer.finalize().unwrap();
    cursor.set_position(0);
    WavReader::open(cursor).unwrap()
}

fn next_frame<R: Source>(inputs: &mut Inputs<R>, name: &str) -> Result<Option<Frame>, AudioError> {
    let mut samples = inputs.get_mut(name)?.get_next(1)?;
    Ok(samples.pop().and_then(Sample::into_frame))
}

fn collect<R: Source>(reader: &mut WavReader<R>) -> Vec<Frame> {
    reader.frames().collect::<Result<_, _>>().unwrap()
}

#[test]
fn test_mix_two_inputs_until_shortest_ends() {
    let mut session = Session::new()
        .with_input("a", stream(&[[100, 200], [300, 400], [500, 600]]))
        .with_input("b", stream(&[[1, 2], [3, 4]]));

    let mut mixed = session
        .process(Cursor::new(Vec::new()), |inputs, _step| {
            let a = next_frame(inputs, "a")?;
            let b = next_frame(inputs, "b")?;
            Ok(match (a, b) {
                (Some(a), Some(b)) => Sample::Frame(a.iter().zip(&b).map(|(x, y)| x + y).collect()),
                _ => Sample::Eof,
            })
        })
        .unwrap();

    assert_eq!(mixed.sample_count(), 2);
    assert_eq!(collect(&mut mixed), vec![vec![101, 202], vec![303, 404]]);

    // The combinator consumed one frame of "a" past the end of "b".
    assert_eq!(session.inputs().get("a").unwrap().position(), 3);
}

#[test]
fn test_step_counter_is_passed_through() {
    let mut session: Session<Cursor<Vec<u8>>> = Session::new();
    let mut seen = Vec::new();

    let mut output = session
        .process(Cursor::new(Vec::new()), |_inputs, step| {
            seen.push(step);
            Ok(if step < 4 {
                Sample::Frame(vec![step as i32 * 10])
            } else {
                Sample::Eof
            })
        })
        .unwrap();

    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    assert_eq!(
        collect(&mut output),
        vec![vec![0, 0], vec![10, 10], vec![20, 20], vec![30, 30]]
    );
}

#[test]
fn test_immediate_eof_produces_empty_stream() {
    let mut session: Session<Cursor<Vec<u8>>> = Session::new();
    let mut output = session
        .process(Cursor::new(Vec::new()), |_, _| Ok(Sample::Eof))
        .unwrap();

    assert_eq!(output.sample_count(), 0);
    assert_eq!(output.get_next(1).unwrap(), vec![Sample::Eof]);
}

#[test]
fn test_output_chains_into_next_session() {
    let mut first = Session::from_reader("src", stream(&[[1000, -1000], [2000, -2000]]));
    let doubled = first
        .process(Cursor::new(Vec::new()), |inputs, _| {
            Ok(match next_frame(inputs, "src")? {
                Some(frame) => Sample::Frame(frame.iter().map(|v| v * 2).collect()),
                None => Sample::Eof,
            })
        })
        .unwrap();

    let mut second = Session::from_reader("src", doubled);
    let mut inverted = second
        .process(Cursor::new(Vec::new()), |inputs, _| {
            Ok(match next_frame(inputs, "src")? {
                Some(frame) => Sample::Frame(frame.iter().map(|v| -v).collect()),
                None => Sample::Eof,
            })
        })
        .unwrap();

    assert_eq!(
        collect(&mut inverted),
        vec![vec![-2000, 2000], vec![-4000, 4000]]
    );
}

#[test]
fn test_buffered_output_matches_seekable_output() {
    let combinator = |inputs: &mut Inputs<Cursor<Vec<u8>>>, _step: u64| -> Result<Sample, AudioError> {
        Ok(match next_frame(inputs, "in")? {
            Some(frame) => Sample::Frame(vec![frame[0] * 3]),
            None => Sample::Eof,
        })
    };

    let mut seekable_session = Session::from_reader("in", stream(&[[10, 0], [20000, 0]]));
    let seekable = seekable_session
        .process(Cursor::new(Vec::new()), combinator)
        .unwrap();

    let mut buffered_session = Session::from_reader("in", stream(&[[10, 0], [20000, 0]]));
    let buffered = buffered_session
        .process(Unseekable::new(Cursor::new(Vec::new())), combinator)
        .unwrap();
    assert!(!buffered.is_seekable());

    let seekable_bytes = seekable.into_inner().into_inner();
    let buffered_bytes = buffered.into_inner().into_inner().into_inner();
    assert_eq!(seekable_bytes, buffered_bytes);
    assert_eq!(
        i16::from_le_bytes([seekable_bytes[48], seekable_bytes[49]]),
        32767
    );
}

#[test]
fn test_random_access_inside_combinator() {
    // Reverse the input using index() while a sequential cursor stays put.
    let mut session = Session::from_reader("in", stream(&[[1, 1], [2, 2], [3, 3]]));

    let mut reversed = session
        .process(Cursor::new(Vec::new()), |inputs, step| {
            let input = inputs.get_mut("in")?;
            let count = input.sample_count();
            if step >= count {
                return Ok(Sample::Eof);
            }
            input.index(count - 1 - step)
        })
        .unwrap();

    assert_eq!(
        collect(&mut reversed),
        vec![vec![3, 3], vec![2, 2], vec![1, 1]]
    );
    assert_eq!(session.inputs().get("in").unwrap().position(), 0);
}

#[test]
fn test_unknown_input_aborts_processing() {
    let mut session = Session::from_reader("a", stream(&[[1, 1]]));
    let err = session
        .process(Cursor::new(Vec::new()), |inputs, _| {
            next_frame(inputs, "missing").map(|_| Sample::Eof)
        })
        .unwrap_err();

    match err {
        AudioError::UnknownInput { name } => assert_eq!(name, "missing"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_rewind_error_propagates_from_combinator() {
    let bytes = {
        let mut writer = WavWriter::create(Cursor::new(Vec::new())).unwrap();
        writer.append_all([[1, 1], [2, 2]]).unwrap();
        writer.finalize().unwrap().0.into_inner()
    };
    let reader = WavReader::open(Unseekable::new(Cursor::new(bytes))).unwrap();
    let mut session = Session::from_reader("pipe", reader);

    let err = session
        .process(Cursor::new(Vec::new()), |inputs, step| {
            let input = inputs.get_mut("pipe")?;
            // Step 0 moves the reader to frame 1, step 1 asks for frame 0 again.
            input.index(1 - step)
        })
        .unwrap_err();

    assert!(matches!(err, AudioError::Sequence { .. }), "got {err:?}");
}

#[test]
fn test_builder_and_mutator_are_distinct() {
    let base: Session<Cursor<Vec<u8>>> = Session::new();
    let extended = base.with_input("a", stream(&[[1, 1]]));
    assert_eq!(extended.inputs().len(), 1);

    let mut session = extended;
    session
        .add_input("b", stream(&[[2, 2]]))
        .add_input("c", stream(&[[3, 3]]));
    assert_eq!(session.inputs().names().collect::<Vec<_>>(), vec!["a", "b", "c"]);

    session.add_input("a", stream(&[[9, 9], [9, 9]]));
    assert_eq!(session.inputs().len(), 3);
    assert_eq!(session.inputs().get("a").unwrap().sample_count(), 2);

    let removed = session.inputs_mut().remove("b");
    assert!(removed.is_some());
    assert!(!session.inputs().contains("b"));
}

#[test]
fn test_boxed_sources_of_different_types() {
    let seekable: Box<dyn Source> = {
        let mut cursor = stream(&[[5, 5]]).into_inner();
        cursor.set_position(0);
        Box::new(cursor)
    };
    let forward_only: Box<dyn Source> = {
        let mut cursor = stream(&[[7, 7]]).into_inner();
        cursor.set_position(0);
        Box::new(Unseekable::new(cursor))
    };

    let mut session = Session::new()
        .with_input("seek", WavReader::open(seekable).unwrap())
        .with_input("pipe", WavReader::open(forward_only).unwrap());
    assert!(session.inputs().get("seek").unwrap().is_seekable());
    assert!(!session.inputs().get("pipe").unwrap().is_seekable());

    let mut output = session
        .process(Cursor::new(Vec::new()), |inputs, _| {
            let a = next_frame(inputs, "seek")?;
            let b = next_frame(inputs, "pipe")?;
            Ok(match (a, b) {
                (Some(a), Some(b)) => Sample::Frame(vec![a[0] + b[0], a[1] - b[1]]),
                _ => Sample::Eof,
            })
        })
        .unwrap();

    assert_eq!(collect(&mut output), vec![vec![12, -2]]);
}

#[test]
fn test_process_on_temp_file() {
    let mut session = Session::from_reader("in", stream(&[[1, 2], [3, 4]]));
    let mut output = session
        .process(tempfile::tempfile().unwrap(), |inputs, _| {
            Ok(match next_frame(inputs, "in")? {
                Some(frame) => Sample::Frame(frame),
                None => Sample::Eof,
            })
        })
        .unwrap();

    assert!(output.is_seekable());
    assert_eq!(collect(&mut output), vec![vec![1, 2], vec![3, 4]]);
}

#[test]
fn test_inputs_can_be_rewound_and_reused_after_processing() {
    let mut session = Session::new()
        .with_input("a", stream(&[[1, 1], [2, 2]]))
        .with_input("b", stream(&[[10, 10]]));

    session
        .process(Cursor::new(Vec::new()), |inputs, _| {
            let a = next_frame(inputs, "a")?;
            let b = next_frame(inputs, "b")?;
            Ok(match (a, b) {
                (Some(a), Some(_)) => Sample::Frame(a),
                _ => Sample::Eof,
            })
        })
        .unwrap();

    let mut inputs = session.into_inputs();
    let mut names = Vec::new();
    for (name, reader) in inputs.iter_mut() {
        assert!(reader.position() > 0);
        reader.rewind().unwrap();
        names.push(name.to_string());
    }
    assert_eq!(names, vec!["a", "b"]);

    let mut a = inputs.remove("a").unwrap();
    assert_eq!(collect(&mut a), vec![vec![1, 1], vec![2, 2]]);
    assert!(!inputs.is_empty());
}
