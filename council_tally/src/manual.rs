/*!

This is the long-form manual for `council_tally` and `ctally`.

## What is counted

A council election is tallied in three steps:
1. the candidates are registered. A candidate is kept when it runs for council
   member (office code `13`), in the municipality of the election, with a
   candidacy that is not invalid. The party of every candidate is registered,
   including the parties of dropped candidates.
2. the votes are applied. Targets `95` to `98` are blank and null votes and are
   never counted. Targets above `99` are votes for a candidate (nominal votes)
   and also count for the candidate's party. Other targets are votes for a
   party (list votes).
3. the statistics are computed.

The number of seats is the number of candidates whose official outcome is
*elected by party quota* (`2`) or *elected by average* (`3`). The outcome
*elected* (`1`) does not take a council seat.

## Input formats

Both files follow the open data published by the Brazilian electoral court
(TSE): `;`-separated values, every field between double quotes, a header row,
ISO-8859-1 encoding. Columns are found by their header name and may appear in
any order; other columns are ignored.

### Candidates (`consulta_cand`)

| column              | content                                      |
|---------------------|----------------------------------------------|
| `SG_UE`             | municipality code                            |
| `CD_CARGO`          | office code                                  |
| `NR_CANDIDATO`      | candidacy number                             |
| `NM_URNA_CANDIDATO` | ballot name                                  |
| `NR_PARTIDO`        | party number                                 |
| `SG_PARTIDO`        | party acronym                                |
| `NR_FEDERACAO`      | federation number, `-1` if none              |
| `DT_NASCIMENTO`     | birth date, `dd/mm/yyyy`                     |
| `CD_SIT_TOT_TURNO`  | outcome code                                 |
| `CD_GENERO`         | gender code: `2` male, `4` female            |

### Votes (`votacao_secao`)

| column         | content                         |
|----------------|---------------------------------|
| `CD_CARGO`     | office code                     |
| `CD_MUNICIPIO` | municipality code               |
| `NR_VOTAVEL`   | candidate or party number       |
| `QT_VOTOS`     | number of votes                 |

Rows of other municipalities are skipped when the file is read.

## Configuration

The command line is enough for most uses:

```bash
ctally --municipality 57053 --candidates consulta_cand.csv \
  --votes votacao_secao.csv --date 06/10/2024
```

The same information can be stored in a JSON file passed with `--config`.
Paths are relative to the configuration file. Command line arguments take
precedence over the file.

```json
{
  "outputSettings": {
    "contestName": "Vitória 2024",
    "contestDate": "06/10/2024",
    "contestJurisdiction": "57053",
    "outputDirectory": "out"
  },
  "candidateFileSource": { "provider": "tse_csv", "filePath": "consulta_cand.csv" },
  "voteFileSource": { "provider": "tse_csv", "filePath": "votacao_secao.csv" }
}
```

File sources accept two optional keys:
 - `delimiter` (string of one character, default `;`)
 - `encoding` (`latin1` or `utf8`, default `latin1`)

With `outputDirectory`, the summary is written there as `summary.json` unless
`--out` says otherwise. `--reference` compares the summary with a stored one.

 */
